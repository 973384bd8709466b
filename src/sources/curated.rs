use async_trait::async_trait;

use super::StationSource;
use crate::{
    config::{CuratedConfig, CuratedStation},
    stations::{RadioRecord, SourceName},
};

/// Hand-maintained list of known station ids. Answers from memory, so its
/// records only carry the id; details come from the primary source.
pub struct CuratedSource {
    stations: Vec<CuratedStation>,
}

impl CuratedSource {
    pub fn new(config: &CuratedConfig) -> Self {
        Self {
            stations: config.stations.clone(),
        }
    }

    fn records<'a>(
        &'a self,
        country: &'a str,
        matches: impl Fn(&CuratedStation) -> bool + 'a,
    ) -> impl Iterator<Item = RadioRecord> + 'a {
        self.stations
            .iter()
            .filter(move |station| station.country == country && matches(*station))
            .filter_map(|station| {
                RadioRecord::new(SourceName::Curated, &station.id, &station.id)
                    .map(|record| record.with_country(&station.country))
            })
    }
}

#[async_trait]
impl StationSource for CuratedSource {
    fn name(&self) -> SourceName {
        SourceName::Curated
    }

    async fn search_by_name(&self, query: &str, country: &str) -> Vec<RadioRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.records(country, |station| station.id.contains(&needle))
            .collect()
    }

    async fn fetch_by_country(&self, country: &str) -> Vec<RadioRecord> {
        self.records(country, |_| true).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_curated_stations;

    fn source() -> CuratedSource {
        CuratedSource::new(&CuratedConfig {
            stations: parse_curated_stations("mg:rdj,mg:radiodon,mg:rnm,fr:rdjfr").unwrap(),
        })
    }

    #[tokio::test]
    async fn search_matches_id_substring_within_country() {
        let records = source().search_by_name(" RD ", "mg").await;
        let ids: Vec<&str> = records.iter().map(|r| r.source_id()).collect();
        assert_eq!(ids, vec!["rdj"]);
        assert_eq!(records[0].source_name(), SourceName::Curated);
        assert_eq!(records[0].country(), Some("mg"));
    }

    #[tokio::test]
    async fn blank_query_matches_nothing() {
        assert!(source().search_by_name("  ", "mg").await.is_empty());
    }

    #[tokio::test]
    async fn country_listing_and_missing_fetch() {
        let source = source();
        assert_eq!(source.fetch_by_country("mg").await.len(), 3);
        assert!(source.fetch_by_id("rdj", "mg").await.is_none());
    }
}
