use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::{
    aggregator::Aggregator,
    config::Config,
    error::ResolveError,
    resolver::Resolver,
    sources::{
        CuratedSource, HttpTransport, OnlineRadioBoxSource, RadioBrowserSource, ReqwestTransport,
        StationSource,
    },
    stations::{is_country_code, RadioRecord, SourceQuery},
};

/// Body of a listing: `{"count": n, "radios": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct RadioList {
    pub count: usize,
    pub radios: Vec<RadioRecord>,
}

impl From<Vec<RadioRecord>> for RadioList {
    fn from(radios: Vec<RadioRecord>) -> Self {
        Self {
            count: radios.len(),
            radios,
        }
    }
}

/// Everything a request needs. Cheap to clone; no state is shared between
/// requests beyond the immutable adapters.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    resolver: Arc<Resolver>,
    aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn initialize(config: Config) -> anyhow::Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(
            ReqwestTransport::new(&config.http, config.allow_insecure_transports)
                .context("failed to build http client")?,
        );
        let primary: Arc<dyn StationSource> = Arc::new(
            OnlineRadioBoxSource::new(&config.online_radio_box, transport.clone())
                .context("invalid OnlineRadioBox configuration")?,
        );
        let secondary: Arc<dyn StationSource> = Arc::new(
            RadioBrowserSource::new(config.radio_browser.clone(), transport)
                .context("invalid Radio Browser configuration")?,
        );
        let curated: Arc<dyn StationSource> = Arc::new(CuratedSource::new(&config.curated));

        let resolver = Resolver::standard(
            primary.clone(),
            secondary.clone(),
            config.resolver.curated_first.then(|| curated.clone()),
            config.resolver.deadline(),
        );
        let aggregator = Aggregator::new(primary, secondary).with_curated(curated);
        Ok(Self::from_parts(config, resolver, aggregator))
    }

    pub fn from_parts(config: Config, resolver: Resolver, aggregator: Aggregator) -> Self {
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            aggregator: Arc::new(aggregator),
        }
    }

    pub fn strategy_labels(&self) -> Vec<&'static str> {
        self.resolver.strategy_labels()
    }

    /// Country listing when `query` is blank, primary-only search otherwise.
    pub async fn list_radios(
        &self,
        country: Option<&str>,
        query: Option<&str>,
    ) -> Result<RadioList, ResolveError> {
        let request = self.source_query(query.unwrap_or_default(), country)?;
        let query = (!request.query.is_empty()).then_some(request.query.as_str());
        Ok(self.aggregator.list(&request.country, query).await.into())
    }

    /// Curated stations of the country, each loaded from the primary source.
    pub async fn list_curated(&self, country: Option<&str>) -> Result<RadioList, ResolveError> {
        let request = self.source_query("", country)?;
        Ok(self.aggregator.list_curated(&request.country).await.into())
    }

    pub async fn resolve_radio(
        &self,
        name: &str,
        country: Option<&str>,
    ) -> Result<RadioRecord, ResolveError> {
        let request = self.source_query(name, country)?;
        self.resolver
            .resolve(&request.query, &request.country)
            .await
            .ok_or_else(|| ResolveError::NotFound(request.query.clone()))
    }

    fn source_query(
        &self,
        query: &str,
        country: Option<&str>,
    ) -> Result<SourceQuery, ResolveError> {
        let country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.config.default_country.as_str());
        let request = SourceQuery::by_name(query, Some(country));
        if !is_country_code(&request.country) {
            return Err(ResolveError::InvalidCountry(country.to_string()));
        }
        Ok(request)
    }
}
