//! Address geocoding with a persistent time-limited cache.
//!
//! The cache is an optimization only: every storage failure is logged and
//! treated as a miss, never surfaced to the caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

pub const CACHE_VERSION: &str = "1.0";
pub const DEFAULT_TTL_DAYS: i64 = 30;
pub const DEFAULT_ENDPOINT: &str = "https://api-adresse.data.gouv.fr/search/";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io: {0}")]
    Io(#[from] io::Error),
    #[error("cache document is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported cache version {0:?}")]
    Version(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Request(#[from] Box<ureq::Error>),
    #[error("unreadable response: {0}")]
    Response(#[from] io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct CacheEntry {
    latitude: f64,
    longitude: f64,
    /// Unix milliseconds
    timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    version: String,
    data: HashMap<String, CacheEntry>,
}

impl Default for CacheDocument {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            data: HashMap::new(),
        }
    }
}

/// Raw storage for the serialized cache document
pub trait CacheStore {
    /// `Ok(None)` when nothing has been stored yet
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, contents: &str) -> io::Result<()>;
}

/// JSON file on disk
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tailorpulse")
            .join("geocode-cache.json")
    }
}

impl CacheStore for FileStore {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)
    }
}

/// In-process store, mostly for tests
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryStore {
    contents: RefCell<Option<String>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: RefCell::new(Some(contents.to_string())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.contents.borrow().clone())
    }

    fn save(&self, contents: &str) -> io::Result<()> {
        *self.contents.borrow_mut() = Some(contents.to_string());
        Ok(())
    }
}

/// Case- and whitespace-insensitive cache key
pub fn cache_key(address: &str, postal_code: &str, city: &str) -> String {
    [address, postal_code, city]
        .iter()
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|")
}

pub struct GeocodeCache<S: CacheStore> {
    store: S,
    ttl: Duration,
}

impl<S: CacheStore> GeocodeCache<S> {
    #[allow(dead_code)]
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::days(DEFAULT_TTL_DAYS))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, address: &str, postal_code: &str, city: &str) -> Option<Coordinates> {
        self.get_at(address, postal_code, city, Utc::now())
    }

    /// Lookup valid at `now`. Expired entries read as misses but stay stored until [`Self::prune`].
    pub fn get_at(&self, address: &str, postal_code: &str, city: &str, now: DateTime<Utc>) -> Option<Coordinates> {
        let doc = self.read_or_log()?;
        let entry = doc.data.get(&cache_key(address, postal_code, city))?;
        if self.is_fresh(entry, now) {
            Some(Coordinates {
                latitude: entry.latitude,
                longitude: entry.longitude,
            })
        } else {
            None
        }
    }

    pub fn set(&self, address: &str, postal_code: &str, city: &str, coords: Coordinates) {
        self.set_at(address, postal_code, city, coords, Utc::now());
    }

    pub fn set_at(&self, address: &str, postal_code: &str, city: &str, coords: Coordinates, now: DateTime<Utc>) {
        // an unreadable document is replaced rather than blocking writes forever
        let mut doc = self.read_or_log().unwrap_or_default();
        doc.data.insert(
            cache_key(address, postal_code, city),
            CacheEntry {
                latitude: coords.latitude,
                longitude: coords.longitude,
                timestamp: now.timestamp_millis(),
            },
        );
        self.write_or_log(&doc);
    }

    /// Delete expired entries; returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_at(Utc::now())
    }

    pub fn prune_at(&self, now: DateTime<Utc>) -> usize {
        let Some(mut doc) = self.read_or_log() else {
            return 0;
        };
        let before = doc.data.len();
        doc.data.retain(|_, entry| self.is_fresh(entry, now));
        let removed = before - doc.data.len();
        if removed > 0 {
            tracing::info!(removed, remaining = doc.data.len(), "pruned geocode cache");
            self.write_or_log(&doc);
        }
        removed
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.read_or_log().map(|doc| doc.data.len()).unwrap_or(0)
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() - entry.timestamp < self.ttl.num_milliseconds()
    }

    fn read(&self) -> Result<CacheDocument, CacheError> {
        let Some(raw) = self.store.load()? else {
            return Ok(CacheDocument::default());
        };
        let doc: CacheDocument = serde_json::from_str(&raw)?;
        if doc.version != CACHE_VERSION {
            return Err(CacheError::Version(doc.version));
        }
        Ok(doc)
    }

    fn read_or_log(&self) -> Option<CacheDocument> {
        match self.read() {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(error = %e, "geocode cache unreadable, treating as empty");
                None
            }
        }
    }

    fn write_or_log(&self, doc: &CacheDocument) {
        let result = serde_json::to_string(doc)
            .map_err(CacheError::from)
            .and_then(|json| self.store.save(&json).map_err(CacheError::from));
        if let Err(e) = result {
            tracing::warn!(error = %e, "geocode cache write failed");
        }
    }
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// First hit of an address API response, `[lon, lat]` GeoJSON order.
fn parse_features(body: &str) -> Result<Option<Coordinates>, serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    Ok(collection.features.into_iter().next().and_then(|f| match f.geometry.coordinates[..] {
        [longitude, latitude, ..] => Some(Coordinates { latitude, longitude }),
        _ => None,
    }))
}

/// Best-effort address lookup: cache first, then the national address API.
pub struct Geocoder<S: CacheStore> {
    cache: GeocodeCache<S>,
    endpoint: String,
    offline: bool,
}

impl<S: CacheStore> Geocoder<S> {
    pub fn new(cache: GeocodeCache<S>, endpoint: impl Into<String>) -> Self {
        Self {
            cache,
            endpoint: endpoint.into(),
            offline: false,
        }
    }

    /// Never touch the network; answer from the cache only
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn lookup(&self, address: &str, postal_code: &str, city: &str) -> Option<Coordinates> {
        if let Some(hit) = self.cache.get(address, postal_code, city) {
            tracing::debug!(address, postal_code, city, "geocode cache hit");
            return Some(hit);
        }
        if self.offline {
            return None;
        }

        match self.fetch(address, postal_code, city) {
            Ok(Some(coords)) => {
                self.cache.set(address, postal_code, city, coords);
                Some(coords)
            }
            Ok(None) => {
                tracing::info!(address, postal_code, city, "address not found");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, address, "geocoding request failed");
                None
            }
        }
    }

    fn fetch(&self, address: &str, postal_code: &str, city: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let query = format!("{} {} {}", address.trim(), postal_code.trim(), city.trim());
        let url = format!("{}?q={}&limit=1", self.endpoint, urlencoding::encode(&query));

        let body = ureq::get(&url)
            .call()
            .map_err(Box::new)?
            .into_string()?;
        parse_features(&body).map_err(|e| GeocodeError::Response(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
