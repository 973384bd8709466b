//! In-memory stand-ins for the network seams, used by unit tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use url::Url;

use super::{HttpTransport, StationSource};
use crate::{
    error::SourceError,
    stations::{RadioRecord, SourceName},
};

/// Serves canned bodies keyed by URL path and records every request.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<(String, Result<String, String>)>,
    requests: Mutex<Vec<Url>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, path: &str, body: &str) -> Self {
        self.routes.push((path.to_string(), Ok(body.to_string())));
        self
    }

    pub fn with_failure(mut self, path: &str, message: &str) -> Self {
        self.routes.push((path.to_string(), Err(message.to_string())));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<Url> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get_text(&self, url: Url) -> Result<String, SourceError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.clone());
        }
        match self.routes.iter().find(|(path, _)| path == url.path()) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(message))) => Err(SourceError::Transport(message.clone())),
            None => Err(SourceError::NotFound),
        }
    }
}

/// Adapter with scripted answers and per-capability call counters.
pub struct FakeSource {
    name: SourceName,
    by_id: HashMap<String, RadioRecord>,
    search: Vec<RadioRecord>,
    listing: Vec<RadioRecord>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl FakeSource {
    pub fn new(name: SourceName) -> Self {
        Self {
            name,
            by_id: HashMap::new(),
            search: Vec::new(),
            listing: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_station(mut self, id: &str, record: RadioRecord) -> Self {
        self.by_id.insert(id.to_string(), record);
        self
    }

    pub fn with_search(mut self, records: Vec<RadioRecord>) -> Self {
        self.search = records;
        self
    }

    pub fn with_listing(mut self, records: Vec<RadioRecord>) -> Self {
        self.listing = records;
        self
    }

    pub fn calls(&self, capability: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|(c, _)| *c == capability).count())
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }

    /// Arguments of every call to `capability`, in order.
    pub fn arguments(&self, capability: &str) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(c, _)| *c == capability)
                    .map(|(_, arg)| arg.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn record_call(&self, capability: &'static str, argument: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((capability, argument));
        }
    }
}

#[async_trait]
impl StationSource for FakeSource {
    fn name(&self) -> SourceName {
        self.name
    }

    async fn fetch_by_id(&self, id: &str, country: &str) -> Option<RadioRecord> {
        self.record_call("fetch_by_id", format!("{country}/{id}"));
        self.by_id.get(id).cloned()
    }

    async fn search_by_name(&self, query: &str, country: &str) -> Vec<RadioRecord> {
        self.record_call("search_by_name", format!("{country}/{query}"));
        self.search.clone()
    }

    async fn fetch_by_country(&self, country: &str) -> Vec<RadioRecord> {
        self.record_call("fetch_by_country", country.to_string());
        self.listing.clone()
    }
}
