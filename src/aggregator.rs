use std::sync::Arc;

use serde_json::json;

use crate::{
    logging::logger,
    sources::StationSource,
    stations::{normalize_key, DedupKeys, RadioRecord, SourceQuery},
};

/// Builds country listings from the primary catalog, topped up with stations
/// only the secondary directory knows about.
pub struct Aggregator {
    primary: Arc<dyn StationSource>,
    secondary: Arc<dyn StationSource>,
    curated: Option<Arc<dyn StationSource>>,
}

impl Aggregator {
    pub fn new(primary: Arc<dyn StationSource>, secondary: Arc<dyn StationSource>) -> Self {
        Self {
            primary,
            secondary,
            curated: None,
        }
    }

    pub fn with_curated(mut self, curated: Arc<dyn StationSource>) -> Self {
        self.curated = Some(curated);
        self
    }

    /// Blank query lists the country; anything else is a primary-only search.
    pub async fn list(&self, country: &str, query: Option<&str>) -> Vec<RadioRecord> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => self.search(query, country).await,
            None => self.list_by_country(country).await,
        }
    }

    pub async fn list_by_country(&self, country: &str) -> Vec<RadioRecord> {
        let primary = self.primary.fetch_by_country(country).await;
        let secondary = self.secondary.fetch_by_country(country).await;
        let primary_count = primary.len();
        let secondary_count = secondary.len();
        let merged = merge_listings(primary, secondary);

        logger().info(
            "aggregator.listed",
            json!({
                "country": country,
                "primary": self.primary.name().as_str(),
                "primaryCount": primary_count,
                "secondary": self.secondary.name().as_str(),
                "secondaryCount": secondary_count,
                "total": merged.len(),
            }),
        );
        merged
    }

    /// Curated ids of the country, each loaded from the primary for its name,
    /// image and stream. Ids the primary cannot resolve are skipped.
    pub async fn list_curated(&self, country: &str) -> Vec<RadioRecord> {
        let Some(curated) = &self.curated else {
            return Vec::new();
        };
        let entries = curated.fetch_by_country(country).await;
        let mut records = Vec::with_capacity(entries.len());
        for entry in &entries {
            let detail_country = entry.country().unwrap_or(country);
            if let Some(record) = self
                .primary
                .fetch_by_id(entry.source_id(), detail_country)
                .await
                .filter(|record| !record.name().is_empty())
            {
                records.push(record);
            }
        }

        logger().info(
            "aggregator.curated_listed",
            json!({
                "country": country,
                "curatedCount": entries.len(),
                "resolved": records.len(),
            }),
        );
        records
    }

    /// Search results come from the primary source only and are not merged.
    pub async fn search(&self, query: &str, country: &str) -> Vec<RadioRecord> {
        SourceQuery::by_name(query, Some(country))
            .dispatch(self.primary.as_ref())
            .await
    }
}

/// Primary records keep their order and win every key collision; secondary
/// records only fill keys nobody claimed. Records whose key is empty cannot
/// collide: kept from the primary, dropped from the secondary.
pub fn merge_listings(primary: Vec<RadioRecord>, secondary: Vec<RadioRecord>) -> Vec<RadioRecord> {
    let mut keys = DedupKeys::new();
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());

    for record in primary {
        let key = normalize_key(record.name());
        if key.is_empty() || keys.insert(key) {
            merged.push(record);
        }
    }
    for record in secondary {
        if keys.insert(normalize_key(record.name())) {
            merged.push(record);
        }
    }
    merged
}
