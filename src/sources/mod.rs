//! Adapters over the external station catalogs.
//!
//! Every adapter works internally with `Result<_, SourceError>` and turns
//! failures into "no results" at the `StationSource` boundary, logging them
//! on the way out.

mod curated;
#[cfg(test)]
pub(crate) mod fake;
mod online_radio_box;
mod radio_browser;
mod transport;

pub use curated::CuratedSource;
pub use online_radio_box::OnlineRadioBoxSource;
pub use radio_browser::RadioBrowserSource;
pub use transport::{HttpTransport, ReqwestTransport};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    error::SourceError,
    logging::logger,
    stations::{QueryMode, RadioRecord, SourceName, SourceQuery},
};

/// Capability set of one catalog. Capabilities a catalog does not offer keep
/// the default bodies and answer "no results".
#[async_trait]
pub trait StationSource: Send + Sync {
    fn name(&self) -> SourceName;

    async fn fetch_by_id(&self, _id: &str, _country: &str) -> Option<RadioRecord> {
        None
    }

    async fn search_by_name(&self, _query: &str, _country: &str) -> Vec<RadioRecord> {
        Vec::new()
    }

    async fn fetch_by_country(&self, _country: &str) -> Vec<RadioRecord> {
        Vec::new()
    }
}

impl SourceQuery {
    /// Sends the envelope to the capability its mode names.
    pub async fn dispatch(&self, source: &dyn StationSource) -> Vec<RadioRecord> {
        match self.mode {
            QueryMode::ById => source
                .fetch_by_id(&self.query, &self.country)
                .await
                .into_iter()
                .collect(),
            QueryMode::ByName => source.search_by_name(&self.query, &self.country).await,
            QueryMode::ByCountryListing => source.fetch_by_country(&self.country).await,
        }
    }
}

fn report_failure(
    source: SourceName,
    capability: &'static str,
    query: &str,
    country: &str,
    error: &SourceError,
) {
    let context = json!({
        "source": source.as_str(),
        "capability": capability,
        "query": query,
        "country": country,
        "errorKind": error.kind(),
        "error": error.to_string(),
    });
    match error {
        SourceError::NotFound => logger().debug("source.not_found", context),
        _ => logger().warn("source.request_failed", context),
    }
}

pub(crate) fn absent_on_error(
    source: SourceName,
    capability: &'static str,
    query: &str,
    country: &str,
    result: Result<RadioRecord, SourceError>,
) -> Option<RadioRecord> {
    match result {
        Ok(record) => Some(record),
        Err(error) => {
            report_failure(source, capability, query, country, &error);
            None
        }
    }
}

pub(crate) fn empty_on_error(
    source: SourceName,
    capability: &'static str,
    query: &str,
    country: &str,
    result: Result<Vec<RadioRecord>, SourceError>,
) -> Vec<RadioRecord> {
    match result {
        Ok(records) => records,
        Err(error) => {
            report_failure(source, capability, query, country, &error);
            Vec::new()
        }
    }
}
