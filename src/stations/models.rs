use std::fmt;

use serde::Serialize;

use super::sanitize::{absolute_http_url, upgrade_protocol_relative};
use super::stream_url::normalize_stream;

pub const DEFAULT_COUNTRY: &str = "mg";

/// Tag of the adapter that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceName {
    #[serde(rename = "onlineradiobox")]
    OnlineRadioBox,
    #[serde(rename = "radio-browser")]
    RadioBrowser,
    #[serde(rename = "curated")]
    Curated,
}

impl SourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::OnlineRadioBox => "onlineradiobox",
            SourceName::RadioBrowser => "radio-browser",
            SourceName::Curated => "curated",
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical station record. Fields are only set while the record is being
/// built by an adapter; afterwards it is read through the getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadioRecord {
    name: String,
    #[serde(rename = "imageUrl")]
    image_url: String,
    #[serde(rename = "streamUrl")]
    stream_url: String,
    #[serde(rename = "sourceId")]
    source_id: String,
    #[serde(rename = "sourceName")]
    source_name: SourceName,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
}

impl RadioRecord {
    /// Returns `None` when both the name and the id are blank.
    pub fn new(source_name: SourceName, source_id: &str, name: &str) -> Option<Self> {
        let source_id = source_id.trim();
        let name = name.trim();
        if source_id.is_empty() && name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            image_url: String::new(),
            stream_url: String::new(),
            source_id: source_id.to_string(),
            source_name,
            country: None,
        })
    }

    pub fn with_image(mut self, raw: &str) -> Self {
        let upgraded = upgrade_protocol_relative(raw);
        self.image_url = absolute_http_url(&upgraded).unwrap_or_default();
        self
    }

    /// Runs the raw endpoint through the stream heuristics; anything that is
    /// not an absolute http(s) URL afterwards is dropped.
    pub fn with_stream(mut self, raw: &str) -> Self {
        let normalized = normalize_stream(&upgrade_protocol_relative(raw));
        self.stream_url = absolute_http_url(&normalized).unwrap_or_default();
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        let country = normalize_country(country);
        self.country = (!country.is_empty()).then_some(country);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn source_name(&self) -> SourceName {
        self.source_name
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    ById,
    ByName,
    ByCountryListing,
}

/// Input envelope for a single adapter capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    pub query: String,
    pub country: String,
    pub mode: QueryMode,
}

impl SourceQuery {
    pub fn new(query: &str, country: Option<&str>, mode: QueryMode) -> Self {
        let country = country
            .map(normalize_country)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());
        Self {
            query: query.trim().to_string(),
            country,
            mode,
        }
    }

    pub fn by_id(id: &str, country: Option<&str>) -> Self {
        Self::new(id, country, QueryMode::ById)
    }

    pub fn by_name(name: &str, country: Option<&str>) -> Self {
        Self::new(name, country, QueryMode::ByName)
    }

    pub fn country_listing(country: Option<&str>) -> Self {
        Self::new("", country, QueryMode::ByCountryListing)
    }
}

pub fn normalize_country(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// True for a normalized two-letter code such as `mg`.
pub fn is_country_code(country: &str) -> bool {
    country.len() == 2 && country.bytes().all(|b| b.is_ascii_lowercase())
}
