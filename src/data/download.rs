//! Geography download pipeline.
//!
//! Uses channel-based communication to bridge blocking HTTP fetches
//! with the UI's synchronous update loop.

use super::{parse_geography, GeographyData};
use crate::error::{ErrorKind, MapError, MapResult};
use crate::validation;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use web_time::Instant;

/// Transport timeout for geography requests.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches and parses geography documents.
pub trait GeographyFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> MapResult<GeographyData>;
}

/// Blocking HTTP(S) fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> MapResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| MapError::configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl GeographyFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> MapResult<GeographyData> {
        let load_error = |message: String, cause: Option<&dyn std::error::Error>| {
            MapError::geography_fetch(ErrorKind::GeographyLoad, message, Some(url), cause)
        };

        let checked = validation::validate_url_str(url).map_err(|e| e.with_geography(url))?;
        let response = self
            .client
            .get(checked)
            .send()
            .map_err(|e| load_error(format!("Failed to fetch geography: {}", e), Some(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(load_error(
                format!("Failed to fetch geography: {}", status_text),
                None,
            )
            .with_detail("status", status.as_u16()));
        }

        let body: serde_json::Value = response.json().map_err(|e| {
            MapError::parse(format!("Invalid geography JSON: {}", e)).with_geography(url)
        })?;
        parse_geography(body).map_err(|e| e.with_geography(url))
    }
}

/// Where the current geography request stands.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    /// Nothing requested yet.
    #[default]
    Idle,
    Pending,
    Resolved(Arc<GeographyData>),
    Failed(MapError),
}

impl LoadState {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }

    pub fn data(&self) -> Option<&Arc<GeographyData>> {
        match self {
            LoadState::Resolved(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MapError> {
        match self {
            LoadState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

struct LoadResult {
    generation: u64,
    url: String,
    result: MapResult<GeographyData>,
}

/// Loads one geography URL at a time, last URL wins.
///
/// Each new URL bumps a generation counter; results tagged with an older
/// generation are dropped when polled. In-flight requests are never
/// aborted, only ignored.
pub struct GeographyLoader {
    fetcher: Arc<dyn GeographyFetcher>,
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    url: Option<String>,
    generation: u64,
    state: LoadState,
}

impl GeographyLoader {
    pub fn new(fetcher: Arc<dyn GeographyFetcher>) -> Self {
        let (sender, receiver) = channel();
        Self {
            fetcher,
            sender,
            receiver,
            url: None,
            generation: 0,
            state: LoadState::Idle,
        }
    }

    /// Loader backed by [`HttpFetcher`].
    pub fn http() -> MapResult<Self> {
        Ok(Self::new(Arc::new(HttpFetcher::new()?)))
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Starts fetching `url` unless it is already the current URL.
    ///
    /// Returns `true` when a new request was spawned.
    pub fn load(&mut self, url: &str) -> bool {
        self.load_with_notify(url, || {})
    }

    /// Like [`load`](Self::load), calling `notify` from the worker thread
    /// once the result is queued (e.g. to request a repaint).
    pub fn load_with_notify<F>(&mut self, url: &str, notify: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.url.as_deref() == Some(url) {
            return false;
        }
        self.generation += 1;
        self.url = Some(url.to_string());
        self.state = LoadState::Pending;

        let generation = self.generation;
        let url = url.to_string();
        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();
        log::info!("Fetching geography {} (request {})", url, generation);

        std::thread::spawn(move || {
            let start = Instant::now();
            let result = fetcher.fetch(&url);
            match &result {
                Ok(_) => log::info!(
                    "Fetched geography {} in {:.0}ms",
                    url,
                    start.elapsed().as_secs_f64() * 1000.0
                ),
                Err(e) => log::warn!("Geography fetch failed: {}", e),
            }
            let _ = sender.send(LoadResult {
                generation,
                url,
                result,
            });
            notify();
        });
        true
    }

    /// Forgets the current URL so the next `load` refetches.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.url = None;
        self.state = LoadState::Idle;
    }

    /// Non-blocking check for completed requests.
    ///
    /// Returns `true` if the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.receiver.try_recv() {
            if message.generation != self.generation {
                log::debug!(
                    "Discarding stale geography result for {} (request {}, current {})",
                    message.url,
                    message.generation,
                    self.generation
                );
                continue;
            }
            self.state = match message.result {
                Ok(data) => LoadState::Resolved(Arc::new(data)),
                Err(err) => LoadState::Failed(err),
            };
            changed = true;
        }
        changed
    }

    /// Polls until the current request settles or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> &LoadState {
        let deadline = Instant::now() + timeout;
        while self.state.is_pending() && Instant::now() < deadline {
            match self.receiver.recv_timeout(Duration::from_millis(10)) {
                Ok(message) => {
                    if message.generation == self.generation {
                        self.state = match message.result {
                            Ok(data) => LoadState::Resolved(Arc::new(data)),
                            Err(err) => LoadState::Failed(err),
                        };
                    }
                }
                Err(_) => continue,
            }
        }
        &self.state
    }
}
