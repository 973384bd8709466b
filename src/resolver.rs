//! Fallback chain that turns a free-text query into one playable record.
//!
//! Strategies run one after the other and the first hit wins; later
//! strategies never start once an earlier one has produced a record.

use std::{sync::Arc, time::Duration};

use serde_json::json;

use crate::{
    logging::logger,
    sources::StationSource,
    stations::{normalize_country, RadioRecord, DEFAULT_COUNTRY},
};

pub enum Strategy {
    /// Search one source, then load full detail for the first hit, since
    /// search results carry no stream URL.
    SearchThenFetch {
        search: Arc<dyn StationSource>,
        detail: Arc<dyn StationSource>,
    },
    /// Like `SearchThenFetch`, but walks every candidate in order until one
    /// detail fetch yields a named record.
    CandidatesThenFetch {
        search: Arc<dyn StationSource>,
        detail: Arc<dyn StationSource>,
    },
    /// Treat the lowercased query as a station id.
    DirectId { source: Arc<dyn StationSource> },
    /// Name search where a candidate from the requested country is preferred.
    HealthyNameMatch { source: Arc<dyn StationSource> },
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::SearchThenFetch { .. } => "search_then_fetch",
            Strategy::CandidatesThenFetch { .. } => "candidates_then_fetch",
            Strategy::DirectId { .. } => "direct_id",
            Strategy::HealthyNameMatch { .. } => "healthy_name_match",
        }
    }

    async fn attempt(&self, query: &str, country: &str) -> Option<RadioRecord> {
        match self {
            Strategy::SearchThenFetch { search, detail } => {
                let candidate = search.search_by_name(query, country).await.into_iter().next()?;
                fetch_named(detail.as_ref(), &candidate, country).await
            }
            Strategy::CandidatesThenFetch { search, detail } => {
                for candidate in search.search_by_name(query, country).await {
                    if let Some(record) = fetch_named(detail.as_ref(), &candidate, country).await {
                        return Some(record);
                    }
                }
                None
            }
            Strategy::DirectId { source } => {
                let id = query.trim().to_lowercase();
                source
                    .fetch_by_id(&id, country)
                    .await
                    .filter(|record| !record.name().is_empty())
            }
            Strategy::HealthyNameMatch { source } => {
                // The source already drops entries whose last health check failed.
                let mut candidates = source.search_by_name(query, country).await;
                let index = candidates
                    .iter()
                    .position(|record| record.country() == Some(country))
                    .unwrap_or(0);
                (index < candidates.len()).then(|| candidates.swap_remove(index))
            }
        }
    }
}

async fn fetch_named(
    detail: &dyn StationSource,
    candidate: &RadioRecord,
    country: &str,
) -> Option<RadioRecord> {
    let detail_country = candidate.country().unwrap_or(country);
    detail
        .fetch_by_id(candidate.source_id(), detail_country)
        .await
        .filter(|record| !record.name().is_empty())
}

pub struct Resolver {
    strategies: Vec<Strategy>,
    deadline: Option<Duration>,
}

impl Resolver {
    pub fn new(strategies: Vec<Strategy>, deadline: Option<Duration>) -> Self {
        Self {
            strategies,
            deadline,
        }
    }

    /// Default chain: primary search-then-fetch, primary direct id, secondary
    /// name match. A curated source, when given, is tried first: each matching
    /// id is resolved through the primary until one answers.
    pub fn standard(
        primary: Arc<dyn StationSource>,
        secondary: Arc<dyn StationSource>,
        curated: Option<Arc<dyn StationSource>>,
        deadline: Option<Duration>,
    ) -> Self {
        let mut strategies = Vec::with_capacity(4);
        if let Some(curated) = curated {
            strategies.push(Strategy::CandidatesThenFetch {
                search: curated,
                detail: primary.clone(),
            });
        }
        strategies.push(Strategy::SearchThenFetch {
            search: primary.clone(),
            detail: primary.clone(),
        });
        strategies.push(Strategy::DirectId { source: primary });
        strategies.push(Strategy::HealthyNameMatch { source: secondary });
        Self::new(strategies, deadline)
    }

    pub fn strategy_labels(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::label).collect()
    }

    /// Returns `None` when every strategy came up empty or the deadline hit.
    pub async fn resolve(&self, query: &str, country: &str) -> Option<RadioRecord> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let country = match normalize_country(country) {
            c if c.is_empty() => DEFAULT_COUNTRY.to_string(),
            c => c,
        };

        let Some(deadline) = self.deadline else {
            return self.run_chain(query, &country).await;
        };
        match tokio::time::timeout(deadline, self.run_chain(query, &country)).await {
            Ok(result) => result,
            Err(_) => {
                logger().warn(
                    "resolver.deadline_exceeded",
                    json!({
                        "query": query,
                        "country": country,
                        "deadlineMs": deadline.as_millis() as u64,
                    }),
                );
                None
            }
        }
    }

    async fn run_chain(&self, query: &str, country: &str) -> Option<RadioRecord> {
        for (position, strategy) in self.strategies.iter().enumerate() {
            if let Some(record) = strategy.attempt(query, country).await {
                logger().info(
                    "resolver.resolved",
                    json!({
                        "query": query,
                        "country": country,
                        "strategy": strategy.label(),
                        "position": position,
                        "source": record.source_name().as_str(),
                        "sourceId": record.source_id(),
                    }),
                );
                return Some(record);
            }
            logger().debug(
                "resolver.strategy_missed",
                json!({
                    "query": query,
                    "country": country,
                    "strategy": strategy.label(),
                }),
            );
        }
        logger().info(
            "resolver.exhausted",
            json!({ "query": query, "country": country }),
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OnlineRadioBoxConfig;
    use crate::sources::fake::{FakeSource, FakeTransport};
    use crate::sources::OnlineRadioBoxSource;
    use crate::stations::SourceName;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn record(source: SourceName, id: &str, name: &str, country: &str) -> RadioRecord {
        RadioRecord::new(source, id, name)
            .unwrap()
            .with_country(country)
    }

    fn resolver(primary: &Arc<FakeSource>, secondary: &Arc<FakeSource>) -> Resolver {
        Resolver::standard(primary.clone(), secondary.clone(), None, None)
    }

    #[tokio::test]
    async fn search_then_fetch_short_circuits() {
        let primary = Arc::new(
            FakeSource::new(SourceName::OnlineRadioBox)
                .with_search(vec![record(SourceName::OnlineRadioBox, "rdj", "RDJ", "mg")])
                .with_station(
                    "rdj",
                    record(SourceName::OnlineRadioBox, "rdj", "RDJ", "mg")
                        .with_stream("http://stream.rdj.mg:8000/;"),
                ),
        );
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser));

        let resolved = resolver(&primary, &secondary)
            .resolve("Radio RDJ", "MG")
            .await
            .unwrap();

        assert_eq!(resolved.stream_url(), "http://stream.rdj.mg:8000/;stream.mp3");
        assert_eq!(primary.calls("search_by_name"), 1);
        assert_eq!(primary.arguments("fetch_by_id"), vec!["mg/rdj"]);
        assert_eq!(secondary.total_calls(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_direct_id() {
        let primary = Arc::new(FakeSource::new(SourceName::OnlineRadioBox).with_station(
            "viva",
            record(SourceName::OnlineRadioBox, "viva", "Viva FM", "mg"),
        ));
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser));

        let resolved = resolver(&primary, &secondary)
            .resolve("  VIVA ", "mg")
            .await
            .unwrap();

        assert_eq!(resolved.name(), "Viva FM");
        assert_eq!(primary.arguments("fetch_by_id"), vec!["mg/viva"]);
        assert_eq!(secondary.total_calls(), 0);
    }

    #[tokio::test]
    async fn nameless_detail_does_not_count_as_success() {
        let primary = Arc::new(
            FakeSource::new(SourceName::OnlineRadioBox)
                .with_search(vec![record(SourceName::OnlineRadioBox, "rdj", "RDJ", "mg")])
                .with_station("rdj", record(SourceName::OnlineRadioBox, "rdj", "", "mg")),
        );
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser).with_search(vec![
            record(SourceName::RadioBrowser, "uuid-1", "RDJ", "mg"),
        ]));

        let resolved = resolver(&primary, &secondary)
            .resolve("rdj", "mg")
            .await
            .unwrap();

        assert_eq!(resolved.source_name(), SourceName::RadioBrowser);
        assert_eq!(primary.calls("fetch_by_id"), 2);
    }

    #[tokio::test]
    async fn secondary_prefers_requested_country() {
        let primary = Arc::new(FakeSource::new(SourceName::OnlineRadioBox));
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser).with_search(vec![
            record(SourceName::RadioBrowser, "uuid-fr", "Viva", "fr"),
            record(SourceName::RadioBrowser, "uuid-mg", "Viva", "mg"),
        ]));

        let resolved = resolver(&primary, &secondary)
            .resolve("viva", "mg")
            .await
            .unwrap();
        assert_eq!(resolved.source_id(), "uuid-mg");

        let resolved = resolver(&primary, &secondary)
            .resolve("viva", "de")
            .await
            .unwrap();
        assert_eq!(resolved.source_id(), "uuid-fr");
    }

    #[tokio::test]
    async fn exhaustion_returns_none() {
        let primary = Arc::new(FakeSource::new(SourceName::OnlineRadioBox));
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser));

        assert!(resolver(&primary, &secondary)
            .resolve("nothing", "mg")
            .await
            .is_none());
        assert_eq!(primary.calls("search_by_name"), 1);
        assert_eq!(primary.calls("fetch_by_id"), 1);
        assert_eq!(secondary.calls("search_by_name"), 1);
    }

    #[tokio::test]
    async fn blank_query_makes_no_calls() {
        let primary = Arc::new(FakeSource::new(SourceName::OnlineRadioBox));
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser));
        assert!(resolver(&primary, &secondary).resolve("   ", "mg").await.is_none());
        assert_eq!(primary.total_calls() + secondary.total_calls(), 0);
    }

    #[tokio::test]
    async fn curated_strategy_runs_first_when_enabled() {
        let curated = Arc::new(
            FakeSource::new(SourceName::Curated)
                .with_search(vec![record(SourceName::Curated, "rdj", "rdj", "mg")]),
        );
        let primary = Arc::new(FakeSource::new(SourceName::OnlineRadioBox).with_station(
            "rdj",
            record(SourceName::OnlineRadioBox, "rdj", "RDJ", "mg"),
        ));
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser));
        let resolver = Resolver::standard(
            primary.clone(),
            secondary.clone(),
            Some(curated.clone() as Arc<dyn StationSource>),
            None,
        );
        assert_eq!(
            resolver.strategy_labels(),
            vec![
                "candidates_then_fetch",
                "search_then_fetch",
                "direct_id",
                "healthy_name_match"
            ]
        );

        let resolved = resolver.resolve("rd", "mg").await.unwrap();
        assert_eq!(resolved.source_name(), SourceName::OnlineRadioBox);
        assert_eq!(curated.calls("search_by_name"), 1);
        assert_eq!(primary.calls("search_by_name"), 0);
    }

    #[tokio::test]
    async fn curated_candidates_are_walked_until_one_resolves() {
        let curated = Arc::new(FakeSource::new(SourceName::Curated).with_search(vec![
            record(SourceName::Curated, "radiodon", "radiodon", "mg"),
            record(SourceName::Curated, "rdj", "rdj", "mg"),
            record(SourceName::Curated, "rdj-fm", "rdj-fm", "mg"),
        ]));
        let primary = Arc::new(FakeSource::new(SourceName::OnlineRadioBox).with_station(
            "rdj",
            record(SourceName::OnlineRadioBox, "rdj", "RDJ", "mg"),
        ));
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser));
        let resolver = Resolver::standard(
            primary.clone(),
            secondary.clone(),
            Some(curated as Arc<dyn StationSource>),
            None,
        );

        let resolved = resolver.resolve("d", "mg").await.unwrap();
        assert_eq!(resolved.name(), "RDJ");
        assert_eq!(primary.arguments("fetch_by_id"), vec!["mg/radiodon", "mg/rdj"]);
        assert_eq!(primary.calls("search_by_name"), 0);
    }

    #[tokio::test]
    async fn failing_primary_transport_falls_through_to_secondary() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_failure("/search", "connection reset")
                .with_failure("/mg/rdj/player/", "timed out"),
        );
        let primary = Arc::new(
            OnlineRadioBoxSource::new(&OnlineRadioBoxConfig::default(), transport.clone())
                .unwrap(),
        );
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser).with_search(vec![
            record(SourceName::RadioBrowser, "uuid-1", "RDJ", "mg")
                .with_stream("https://stream.rdj.mg/live.mp3"),
        ]));
        let resolver = Resolver::standard(primary, secondary.clone(), None, None);

        let resolved = resolver.resolve("RDJ", "mg").await.unwrap();
        assert_eq!(resolved.source_name(), SourceName::RadioBrowser);
        assert_eq!(resolved.stream_url(), "https://stream.rdj.mg/live.mp3");
        assert_eq!(transport.request_count(), 2);
        assert_eq!(secondary.calls("search_by_name"), 1);
    }

    struct Stalled;

    #[async_trait]
    impl StationSource for Stalled {
        fn name(&self) -> SourceName {
            SourceName::OnlineRadioBox
        }

        async fn search_by_name(&self, _query: &str, _country: &str) -> Vec<RadioRecord> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Vec::new()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_the_chain() {
        let secondary = Arc::new(FakeSource::new(SourceName::RadioBrowser));
        let resolver = Resolver::standard(
            Arc::new(Stalled),
            secondary.clone(),
            None,
            Some(Duration::from_millis(50)),
        );
        assert!(resolver.resolve("rdj", "mg").await.is_none());
        assert_eq!(secondary.total_calls(), 0);
    }
}
