//! Geographic Boundary Module
//! Fetches, parses and caches the GeoJSON state boundaries backing the
//! choropleth section.

use geojson::{feature::Id, GeoJson, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Explicit timeout on the single external call of a render pass.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Boundary request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Boundary server returned HTTP {0}")]
    Status(u16),
    #[error("Malformed boundary payload: {0}")]
    Malformed(#[from] geojson::Error),
    #[error("Boundary document is not a FeatureCollection")]
    NotFeatureCollection,
    #[error("Earlier fetch of {url} failed: {message}")]
    Cached { url: String, message: String },
}

/// One named polygon region. Only exterior rings are kept; the fill and
/// outline rendering never needs holes.
#[derive(Debug, Clone)]
pub struct BoundaryRegion {
    /// Region identifier, matching the `STATE` codes of the incident data.
    pub id: String,
    pub name: Option<String>,
    /// Exterior rings as `(longitude, latitude)` pairs.
    pub polygons: Vec<Vec<(f64, f64)>>,
}

/// Parsed boundary dataset keyed by region id.
#[derive(Debug, Clone, Default)]
pub struct BoundaryCollection {
    regions: Vec<BoundaryRegion>,
}

impl BoundaryCollection {
    /// Parse a GeoJSON document. Features without an id or without
    /// polygon geometry are skipped; they cannot participate in the
    /// choropleth join.
    pub fn parse(payload: &str) -> Result<Self, FetchError> {
        let geojson: GeoJson = payload.parse()?;
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => return Err(FetchError::NotFeatureCollection),
        };

        let mut regions = Vec::new();
        for feature in collection.features {
            let id = match &feature.id {
                Some(Id::String(s)) => s.clone(),
                Some(Id::Number(n)) => n.to_string(),
                None => {
                    log::debug!("skipping boundary feature without an id");
                    continue;
                }
            };

            let name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get("name"))
                .and_then(|v| v.as_str())
                .map(str::to_string);

            let polygons = match feature.geometry {
                Some(geometry) => exterior_rings(&geometry.value),
                None => Vec::new(),
            };
            if polygons.is_empty() {
                log::debug!("skipping boundary feature {id} without polygon geometry");
                continue;
            }

            regions.push(BoundaryRegion { id, name, polygons });
        }

        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[BoundaryRegion] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&BoundaryRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Bounding box over every ring: `(min lon, min lat, max lon, max lat)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for region in &self.regions {
            for ring in &region.polygons {
                for &(lon, lat) in ring {
                    bounds = Some(match bounds {
                        None => (lon, lat, lon, lat),
                        Some((min_lon, min_lat, max_lon, max_lat)) => (
                            min_lon.min(lon),
                            min_lat.min(lat),
                            max_lon.max(lon),
                            max_lat.max(lat),
                        ),
                    });
                }
            }
        }
        bounds
    }
}

fn exterior_rings(value: &Value) -> Vec<Vec<(f64, f64)>> {
    let ring_points = |ring: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        ring.iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match value {
        Value::Polygon(rings) => rings.first().map(ring_points).into_iter().collect(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first().map(ring_points))
            .collect(),
        _ => Vec::new(),
    }
}

/// Retrieves the raw boundary document. The production transport is
/// HTTP; tests substitute their own.
pub trait BoundaryTransport {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Default transport over a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { client }
    }
}

impl BoundaryTransport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

enum CacheEntry {
    Ready(Arc<BoundaryCollection>),
    Failed(String),
}

/// Process-lifetime boundary cache, owned by the caller rather than
/// hiding behind module state. Each URL resolves exactly once; success
/// and failure are both terminal, so a second call never re-fetches.
pub struct BoundaryStore {
    transport: Box<dyn BoundaryTransport>,
    cache: HashMap<String, CacheEntry>,
}

impl Default for BoundaryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryStore {
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::default())
    }

    pub fn with_transport(transport: impl BoundaryTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            cache: HashMap::new(),
        }
    }

    /// Fetch-or-replay the boundary collection at `url`.
    pub fn get(&mut self, url: &str) -> Result<Arc<BoundaryCollection>, FetchError> {
        if let Some(entry) = self.cache.get(url) {
            return match entry {
                CacheEntry::Ready(collection) => Ok(Arc::clone(collection)),
                CacheEntry::Failed(message) => Err(FetchError::Cached {
                    url: url.to_string(),
                    message: message.clone(),
                }),
            };
        }

        let outcome = self
            .transport
            .fetch(url)
            .and_then(|payload| BoundaryCollection::parse(&payload));

        match outcome {
            Ok(collection) => {
                log::info!("fetched {} boundary regions from {url}", collection.len());
                let collection = Arc::new(collection);
                self.cache
                    .insert(url.to_string(), CacheEntry::Ready(Arc::clone(&collection)));
                Ok(collection)
            }
            Err(err) => {
                log::warn!("boundary fetch from {url} failed: {err}");
                self.cache
                    .insert(url.to_string(), CacheEntry::Failed(err.to_string()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const TWO_STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "CA",
                "properties": {"name": "California"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-124.0, 32.0], [-114.0, 32.0], [-114.0, 42.0], [-124.0, 42.0], [-124.0, 32.0]]]
                }
            },
            {
                "type": "Feature",
                "id": "MI",
                "properties": {"name": "Michigan"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[-90.0, 41.0], [-82.0, 41.0], [-82.0, 46.0], [-90.0, 46.0], [-90.0, 41.0]]],
                        [[[-91.0, 45.0], [-84.0, 45.0], [-84.0, 48.0], [-91.0, 48.0], [-91.0, 45.0]]]
                    ]
                }
            }
        ]
    }"#;

    struct StubTransport {
        calls: Rc<Cell<usize>>,
        response: Result<String, u16>,
    }

    impl BoundaryTransport for StubTransport {
        fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.set(self.calls.get() + 1);
            match &self.response {
                Ok(payload) => Ok(payload.clone()),
                Err(status) => Err(FetchError::Status(*status)),
            }
        }
    }

    #[test]
    fn parses_feature_collection_keyed_by_feature_id() {
        let collection = BoundaryCollection::parse(TWO_STATES).unwrap();
        assert_eq!(collection.len(), 2);

        let ca = collection.region("CA").unwrap();
        assert_eq!(ca.name.as_deref(), Some("California"));
        assert_eq!(ca.polygons.len(), 1);
        assert_eq!(ca.polygons[0].len(), 5);

        let mi = collection.region("MI").unwrap();
        assert_eq!(mi.polygons.len(), 2);

        let (min_lon, min_lat, max_lon, max_lat) = collection.bounds().unwrap();
        assert_eq!((min_lon, min_lat), (-124.0, 32.0));
        assert_eq!((max_lon, max_lat), (-82.0, 48.0));
    }

    #[test]
    fn rejects_non_feature_collection_documents() {
        let doc = serde_json::json!({"type": "Point", "coordinates": [0.0, 0.0]}).to_string();
        let err = BoundaryCollection::parse(&doc).unwrap_err();
        assert!(matches!(err, FetchError::NotFeatureCollection));
    }

    #[test]
    fn rejects_unparseable_payloads() {
        let err = BoundaryCollection::parse("<html>not json</html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn second_get_for_same_url_hits_the_cache() {
        let calls = Rc::new(Cell::new(0));
        let mut store = BoundaryStore::with_transport(StubTransport {
            calls: Rc::clone(&calls),
            response: Ok(TWO_STATES.to_string()),
        });

        let first = store.get("http://example.test/us_states.json").unwrap();
        let second = store.get("http://example.test/us_states.json").unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn failed_fetch_is_terminal_for_the_url() {
        let calls = Rc::new(Cell::new(0));
        let mut store = BoundaryStore::with_transport(StubTransport {
            calls: Rc::clone(&calls),
            response: Err(500),
        });

        let err = store.get("http://example.test/us_states.json").unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));

        let replay = store.get("http://example.test/us_states.json").unwrap_err();
        assert!(matches!(replay, FetchError::Cached { .. }));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn distinct_urls_fetch_independently() {
        let calls = Rc::new(Cell::new(0));
        let mut store = BoundaryStore::with_transport(StubTransport {
            calls: Rc::clone(&calls),
            response: Ok(TWO_STATES.to_string()),
        });

        store.get("http://example.test/a.json").unwrap();
        store.get("http://example.test/b.json").unwrap();
        assert_eq!(calls.get(), 2);
    }
}
