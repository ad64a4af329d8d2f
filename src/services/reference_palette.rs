//! Reference palette resolution: built-in tables, remote CSV tables and a
//! TTL cache shared across requests.
//!
//! Tables are parsed once and handed out as `Arc<ReferenceTable>`; nothing
//! ever mutates a cached table.

use async_trait::async_trait;
use kmeans_palette::{ReferenceColor, ReferenceTable};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::assets::AssetLoader;
use crate::error::ReferenceError;
use crate::models::ReferenceCacheConfig;

/// Where a request wants its reference table from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceSpec {
    /// Built-in (or PALETTES_DIR) table by name
    Builtin(String),
    /// CSV document at a URL
    Url(String),
}

impl ReferenceSpec {
    fn cache_key(&self) -> String {
        match self {
            ReferenceSpec::Builtin(name) => format!("builtin:{name}"),
            ReferenceSpec::Url(url) => format!("url:{url}"),
        }
    }
}

/// Parse a reference table document.
///
/// One color per line, either `label,#RRGGBB` or `label,...,R,G,B`. Extra
/// fields between the label and the channels are folded into the label.
/// Blank lines and lines starting with `#` are ignored. The first data line
/// may be a header; any other line that does not parse is an error.
pub fn parse_reference_table(text: &str) -> Result<ReferenceTable, ReferenceError> {
    let mut entries = Vec::new();
    let mut seen_data_line = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let first = !seen_data_line;
        seen_data_line = true;

        match parse_line(line) {
            Ok(color) => entries.push(color),
            Err(_) if first => {
                tracing::trace!(line = idx + 1, "Skipping reference table header");
            }
            Err(reason) => {
                return Err(ReferenceError::Parse {
                    line: idx + 1,
                    reason,
                })
            }
        }
    }

    Ok(ReferenceTable::new(entries))
}

fn parse_line(line: &str) -> Result<ReferenceColor, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    match fields.as_slice() {
        [label, hex] => {
            if label.is_empty() {
                return Err("empty label".to_string());
            }
            ReferenceColor::from_hex(*label, hex).map_err(|e| e.to_string())
        }
        [label_parts @ .., r, g, b] if !label_parts.is_empty() => {
            let channel = |s: &str| {
                s.parse::<u8>()
                    .map_err(|_| format!("channel {s:?} is not an integer in 0..=255"))
            };
            let (r, g, b) = (channel(*r)?, channel(*g)?, channel(*b)?);
            let label = label_parts
                .iter()
                .filter(|p| !p.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            if label.is_empty() {
                return Err("empty label".to_string());
            }
            Ok(ReferenceColor::from_rgb8(label, r, g, b))
        }
        _ => Err(format!(
            "expected `label,#RRGGBB` or `label,R,G,B`, got {} field(s)",
            fields.len()
        )),
    }
}

/// Fetches reference table documents from outside the process
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ReferenceError>;
}

/// [`ReferenceSource`] backed by an HTTP client
///
/// Bodies larger than `max_bytes` are rejected, either up front from
/// `Content-Length` or while streaming.
pub struct HttpReferenceSource {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpReferenceSource {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, ReferenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stitchpal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReferenceError::Fetch {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl ReferenceSource for HttpReferenceSource {
    async fn fetch(&self, url: &str) -> Result<String, ReferenceError> {
        let fetch_error = |e: reqwest::Error| ReferenceError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let too_large = || ReferenceError::Fetch {
            url: url.to_string(),
            reason: format!("table exceeds {} bytes", self.max_bytes),
        };

        tracing::debug!(url = %url, "Fetching reference table");
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(fetch_error)?
            .error_for_status()
            .map_err(fetch_error)?;

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

struct CachedTable {
    table: Arc<ReferenceTable>,
    cached_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CachedTable>,
    /// Keys by insertion time (oldest first)
    insertion_order: VecDeque<String>,
}

/// Process-wide cache of parsed reference tables with TTL and oldest-first
/// eviction
pub struct ReferenceCache {
    inner: RwLock<CacheInner>,
    ttl: Duration,
    max_entries: usize,
}

impl ReferenceCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_config(config: &ReferenceCacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// Get a table if present and not expired
    pub async fn get(&self, key: &str) -> Option<Arc<ReferenceTable>> {
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                Some(entry) if entry.cached_at.elapsed() <= self.ttl => {
                    return Some(entry.table.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut inner = self.inner.write().await;
        let expired = inner
            .entries
            .get(key)
            .is_some_and(|entry| entry.cached_at.elapsed() > self.ttl);
        if expired {
            inner.entries.remove(key);
            inner.insertion_order.retain(|k| k != key);
            tracing::debug!(key = %key, "Reference cache: dropped expired entry");
        }
        None
    }

    pub async fn store(&self, key: String, table: Arc<ReferenceTable>) {
        let mut inner = self.inner.write().await;

        if inner.entries.remove(&key).is_some() {
            inner.insertion_order.retain(|k| k != &key);
        }

        while inner.entries.len() >= self.max_entries {
            let Some(oldest) = inner.insertion_order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!(
                key = %oldest,
                cache_size = inner.entries.len(),
                "Reference cache: evicted oldest entry"
            );
        }

        inner.entries.insert(
            key.clone(),
            CachedTable {
                table,
                cached_at: Instant::now(),
            },
        );
        inner.insertion_order.push_back(key);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Resolves [`ReferenceSpec`]s to parsed tables, consulting the cache first
///
/// Concurrent misses for the same key share one load: later callers wait on
/// the key's gate and then find the table in the cache.
pub struct ReferencePalettes {
    assets: Arc<AssetLoader>,
    source: Arc<dyn ReferenceSource>,
    cache: ReferenceCache,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReferencePalettes {
    pub fn new(
        assets: Arc<AssetLoader>,
        source: Arc<dyn ReferenceSource>,
        cache: ReferenceCache,
    ) -> Self {
        Self {
            assets,
            source,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Names of the built-in palettes
    pub fn list(&self) -> Vec<String> {
        self.assets.list_palettes()
    }

    pub async fn resolve(&self, spec: &ReferenceSpec) -> Result<Arc<ReferenceTable>, ReferenceError> {
        let key = spec.cache_key();
        if let Some(table) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "Reference table served from cache");
            return Ok(table);
        }

        let gate = self
            .in_flight
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .clone();
        let result = {
            let _loading = gate.lock().await;
            match self.cache.get(&key).await {
                Some(table) => {
                    tracing::debug!(key = %key, "Reference table loaded by a concurrent request");
                    Ok(table)
                }
                None => self.load(spec, &key).await,
            }
        };

        let mut in_flight = self.in_flight.lock().await;
        if in_flight.get(&key).is_some_and(|g| Arc::ptr_eq(g, &gate)) {
            in_flight.remove(&key);
        }
        result
    }

    async fn load(
        &self,
        spec: &ReferenceSpec,
        key: &str,
    ) -> Result<Arc<ReferenceTable>, ReferenceError> {
        let text = match spec {
            ReferenceSpec::Builtin(name) => self
                .assets
                .read_palette(name)?
                .ok_or_else(|| ReferenceError::UnknownPalette(name.clone()))?,
            ReferenceSpec::Url(url) => self.source.fetch(url).await?,
        };

        let table = Arc::new(parse_reference_table(&text)?);
        tracing::info!(key = %key, colors = table.len(), "Loaded reference table");
        self.cache.store(key.to_string(), table.clone()).await;
        Ok(table)
    }
}
