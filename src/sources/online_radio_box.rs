//! OnlineRadioBox scraper (primary source).
//!
//! Markup contract, v1:
//! - player page `/{cc}/{id}/player/`: one `button#set_radio_button` whose
//!   `stream`, `radioname` and `radioimg` attributes carry the station.
//! - catalog and search pages: repeated `li.stations__station` items, each
//!   holding an `a[href="/{cc}/{id}/"]`, an `img` and a `figcaption`.
//!   Genre/city links reuse the same markup and are filtered out by href.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{absent_on_error, empty_on_error, HttpTransport, StationSource};
use crate::{
    config::OnlineRadioBoxConfig,
    error::SourceError,
    stations::{is_country_code, RadioRecord, SourceName},
};

const PLAYER_BUTTON: &str = "button#set_radio_button";
const LISTING_ITEM: &str = "li.stations__station";
const NAVIGATION_SEGMENTS: &[&str] = &[
    "genre", "genres", "city", "cities", "region", "regions", "language", "search", "top",
    "new", "popular", "recent",
];

pub struct OnlineRadioBoxSource {
    player_base: Url,
    catalog_base: Url,
    transport: Arc<dyn HttpTransport>,
}

impl OnlineRadioBoxSource {
    pub fn new(
        config: &OnlineRadioBoxConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            player_base: Url::parse(config.player_base_url.trim())?,
            catalog_base: Url::parse(config.catalog_base_url.trim())?,
            transport,
        })
    }

    fn player_url(&self, id: &str, country: &str) -> Result<Url, SourceError> {
        let country = country_segment(country)?;
        let mut url = self.player_base.join(&format!(
            "/{}/{}/player/",
            country,
            urlencoding::encode(id)
        ))?;
        url.query_pairs_mut()
            .append_pair("played", "1")
            .append_pair("cs", &format!("{country}.{id}"))
            .append_pair("os", "android");
        Ok(url)
    }

    fn search_url(&self, query: &str, country: &str) -> Result<Url, SourceError> {
        let country = country_segment(country)?;
        let mut url = self.catalog_base.join("/search")?;
        url.query_pairs_mut()
            .append_pair("c", country)
            .append_pair("q", query);
        Ok(url)
    }

    fn country_url(&self, country: &str) -> Result<Url, SourceError> {
        let country = country_segment(country)?;
        Ok(self.catalog_base.join(&format!("/{country}/"))?)
    }

    async fn try_fetch_by_id(&self, id: &str, country: &str) -> Result<RadioRecord, SourceError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SourceError::NotFound);
        }
        let body = self.transport.get_text(self.player_url(id, country)?).await?;
        parse_player(&body, id, country)
    }

    async fn try_listing(&self, url: Url) -> Result<Vec<RadioRecord>, SourceError> {
        let body = self.transport.get_text(url).await?;
        parse_listing(&body, &self.catalog_base)
    }
}

#[async_trait]
impl StationSource for OnlineRadioBoxSource {
    fn name(&self) -> SourceName {
        SourceName::OnlineRadioBox
    }

    async fn fetch_by_id(&self, id: &str, country: &str) -> Option<RadioRecord> {
        let result = self.try_fetch_by_id(id, country).await;
        absent_on_error(self.name(), "fetch_by_id", id, country, result)
    }

    async fn search_by_name(&self, query: &str, country: &str) -> Vec<RadioRecord> {
        let result = match self.search_url(query.trim(), country) {
            Ok(url) => self.try_listing(url).await,
            Err(error) => Err(error),
        };
        empty_on_error(self.name(), "search_by_name", query, country, result)
    }

    async fn fetch_by_country(&self, country: &str) -> Vec<RadioRecord> {
        let result = match self.country_url(country) {
            Ok(url) => self.try_listing(url).await,
            Err(error) => Err(error),
        };
        empty_on_error(self.name(), "fetch_by_country", "", country, result)
    }
}

/// Country path segment; anything but `[a-z]{2}` would rewrite the catalog path.
fn country_segment(country: &str) -> Result<&str, SourceError> {
    if is_country_code(country) {
        Ok(country)
    } else {
        Err(SourceError::Parse(format!("invalid country code '{country}'")))
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|err| SourceError::Parse(format!("selector {css}: {err:?}")))
}

fn parse_player(html: &str, id: &str, country: &str) -> Result<RadioRecord, SourceError> {
    let document = Html::parse_document(html);
    let button_selector = selector(PLAYER_BUTTON)?;
    let button = document
        .select(&button_selector)
        .next()
        .ok_or(SourceError::NotFound)?;
    let attr = |name: &str| button.value().attr(name).unwrap_or_default();

    RadioRecord::new(SourceName::OnlineRadioBox, id, attr("radioname"))
        .ok_or(SourceError::NotFound)
        .map(|record| {
            record
                .with_stream(attr("stream"))
                .with_image(attr("radioimg"))
                .with_country(country)
        })
}

fn parse_listing(html: &str, base: &Url) -> Result<Vec<RadioRecord>, SourceError> {
    let document = Html::parse_document(html);
    let item_selector = selector(LISTING_ITEM)?;
    let link_selector = selector("a[href]")?;
    let image_selector = selector("img")?;
    let caption_selector = selector("figcaption")?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for item in document.select(&item_selector) {
        let Some(link) = item.select(&link_selector).next() else {
            continue;
        };
        let Some((country, id)) = link
            .value()
            .attr("href")
            .and_then(|href| station_path(base, href))
        else {
            continue;
        };
        if !seen.insert((country.clone(), id.clone())) {
            continue;
        }

        let image = item.select(&image_selector).next();
        let image_url = image
            .and_then(|img| {
                img.value()
                    .attr("src")
                    .filter(|src| !src.trim().is_empty())
                    .or_else(|| img.value().attr("data-src"))
            })
            .unwrap_or_default();
        let caption = item
            .select(&caption_selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .or_else(|| image.and_then(|img| img.value().attr("alt")).map(str::to_string))
            .unwrap_or_default();

        if let Some(record) = RadioRecord::new(SourceName::OnlineRadioBox, &id, &caption) {
            records.push(record.with_image(image_url).with_country(&country));
        }
    }
    Ok(records)
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts `(country, id)` from a station link, rejecting navigation links.
fn station_path(base: &Url, href: &str) -> Option<(String, String)> {
    let url = base.join(href.trim()).ok()?;
    if url.host_str() != base.host_str() {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let [country, id] = segments.as_slice() else {
        return None;
    };
    let country = country.to_ascii_lowercase();
    let id = id.to_ascii_lowercase();
    if !is_country_code(&country) {
        return None;
    }
    if NAVIGATION_SEGMENTS.contains(&id.as_str()) {
        return None;
    }
    Some((country, id))
}
