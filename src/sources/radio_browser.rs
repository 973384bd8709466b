use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{absent_on_error, empty_on_error, HttpTransport, StationSource};
use crate::{
    config::RadioBrowserConfig,
    error::SourceError,
    stations::{RadioRecord, SourceName},
};

const RADIO_BROWSER_FALLBACK_HOSTS: &[&str] = &[
    "https://de1.api.radio-browser.info",
    "https://de2.api.radio-browser.info",
    "https://fr1.api.radio-browser.info",
    "https://nl1.api.radio-browser.info",
];

/// Radio Browser JSON directory (secondary source). Each call goes to one host
/// of the pool; the cursor spreads calls across mirrors.
pub struct RadioBrowserSource {
    config: RadioBrowserConfig,
    transport: Arc<dyn HttpTransport>,
    host_pool: Vec<Url>,
    host_cursor: AtomicUsize,
}

impl RadioBrowserSource {
    pub fn new(
        config: RadioBrowserConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> anyhow::Result<Self> {
        let mut host_pool: Vec<Url> = Vec::new();
        if !config.default_base_url.trim().is_empty() {
            host_pool.push(Url::parse(config.default_base_url.trim())?);
        }
        for candidate in RADIO_BROWSER_FALLBACK_HOSTS {
            let url = Url::parse(candidate)?;
            if !host_pool
                .iter()
                .any(|existing| existing.host_str() == url.host_str())
            {
                host_pool.push(url);
            }
        }
        Ok(Self {
            config,
            transport,
            host_pool,
            host_cursor: AtomicUsize::new(0),
        })
    }

    fn next_host(&self) -> &Url {
        let index = self.host_cursor.fetch_add(1, Ordering::Relaxed) % self.host_pool.len();
        &self.host_pool[index]
    }

    fn endpoint(&self, path: &str, ordered: bool) -> Url {
        let mut url = self.next_host().clone();
        url.set_path(path);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("hidebroken", "true");
            if ordered {
                query.append_pair("order", "clickcount");
                query.append_pair("reverse", "true");
                if self.config.limit > 0 {
                    query.append_pair("limit", &self.config.limit.to_string());
                }
            }
        }
        url
    }

    async fn try_stations(&self, url: Url) -> Result<Vec<RadioRecord>, SourceError> {
        let body = self.transport.get_text(url).await?;
        let raw: Vec<RadioBrowserStation> = serde_json::from_str(&body)?;
        Ok(raw.into_iter().filter_map(normalize_station).collect())
    }

    async fn try_fetch_by_id(&self, id: &str) -> Result<RadioRecord, SourceError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SourceError::NotFound);
        }
        let url = self.endpoint(
            &format!("/json/stations/byuuid/{}", urlencoding::encode(id)),
            false,
        );
        self.try_stations(url)
            .await?
            .into_iter()
            .next()
            .ok_or(SourceError::NotFound)
    }
}

#[async_trait]
impl StationSource for RadioBrowserSource {
    fn name(&self) -> SourceName {
        SourceName::RadioBrowser
    }

    async fn fetch_by_id(&self, id: &str, country: &str) -> Option<RadioRecord> {
        let result = self.try_fetch_by_id(id).await;
        absent_on_error(self.name(), "fetch_by_id", id, country, result)
    }

    async fn search_by_name(&self, query: &str, country: &str) -> Vec<RadioRecord> {
        let trimmed = query.trim();
        let result = if trimmed.is_empty() {
            Ok(Vec::new())
        } else {
            let url = self.endpoint(
                &format!("/json/stations/byname/{}", urlencoding::encode(trimmed)),
                true,
            );
            self.try_stations(url).await
        };
        empty_on_error(self.name(), "search_by_name", query, country, result)
    }

    async fn fetch_by_country(&self, country: &str) -> Vec<RadioRecord> {
        let url = self.endpoint(
            &format!(
                "/json/stations/bycountrycodeexact/{}",
                urlencoding::encode(country)
            ),
            true,
        );
        let result = self.try_stations(url).await;
        empty_on_error(self.name(), "fetch_by_country", "", country, result)
    }
}

/// Station entry as served by `/json/stations/*`, schema v1. Only the fields
/// the record needs are decoded; missing ones default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RadioBrowserStation {
    stationuuid: String,
    name: String,
    url: Option<String>,
    url_resolved: Option<String>,
    favicon: Option<String>,
    countrycode: Option<String>,
    lastcheckok: Option<i32>,
}

fn normalize_station(raw: RadioBrowserStation) -> Option<RadioRecord> {
    if raw.lastcheckok.unwrap_or_default() != 1 {
        return None;
    }
    let stream_candidate = raw
        .url_resolved
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .or(raw.url.as_deref())
        .unwrap_or_default();

    let record = RadioRecord::new(SourceName::RadioBrowser, &raw.stationuuid, &raw.name)?
        .with_stream(stream_candidate)
        .with_image(raw.favicon.as_deref().unwrap_or_default());
    Some(match raw.countrycode.as_deref() {
        Some(code) => record.with_country(code),
        None => record,
    })
}
