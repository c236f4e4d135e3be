//! OSM PBF source — enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use ev_network::{NetworkSource, OsmPbfSource};
//!
//! let data = OsmPbfSource::new("lausanne.osm.pbf").fetch(&bounds)?;
//! ```
//!
//! # What is loaded
//!
//! Ways tagged with a drivable `highway=*` class (see
//! [`RoadClass::from_highway`]) that have at least one vertex inside the
//! bounds, plus the centroid of every `building=*` way inside the bounds.
//! Relations are ignored.
//!
//! All OSM node coordinates are buffered in a map for the single pass, since
//! ways reference nodes by id.

use std::path::PathBuf;

use osmpbf::{Element, ElementReader};
use rustc_hash::FxHashMap;

use ev_core::{GeoBounds, GeoPoint};

use crate::{GraphError, GraphResult, NetworkData, NetworkSource, RoadClass, RoadPolyline};

/// Reads roads and building centroids from an OSM PBF extract.
#[derive(Clone, Debug)]
pub struct OsmPbfSource {
    pub path: PathBuf,
}

impl OsmPbfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct OsmWay {
    refs:  Vec<i64>,
    class: Option<RoadClass>,
}

impl NetworkSource for OsmPbfSource {
    fn fetch(&self, bounds: &GeoBounds) -> GraphResult<NetworkData> {
        // ── Pass: collect nodes and candidate ways ────────────────────────
        let reader = ElementReader::from_path(&self.path).map_err(|e| GraphError::Osm(e.to_string()))?;

        let mut nodes: FxHashMap<i64, GeoPoint> = FxHashMap::default();
        let mut ways: Vec<OsmWay> = Vec::new();

        reader
            .for_each(|elem| match elem {
                Element::Node(n) => {
                    nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
                }
                Element::DenseNode(n) => {
                    nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
                }
                Element::Way(w) => {
                    let mut class = None;
                    let mut building = false;
                    for (k, v) in w.tags() {
                        match k {
                            "highway" => class = RoadClass::from_highway(v),
                            "building" => building = is_dwelling(v),
                            _ => {}
                        }
                    }
                    if class.is_some() || building {
                        ways.push(OsmWay { refs: w.refs().collect(), class });
                    }
                }
                _ => {}
            })
            .map_err(|e| GraphError::Osm(e.to_string()))?;

        // ── Resolve geometry ──────────────────────────────────────────────
        let mut data = NetworkData::default();
        for way in ways {
            let points: Vec<GeoPoint> = way.refs.iter().filter_map(|r| nodes.get(r).copied()).collect();
            match way.class {
                Some(class) => {
                    if points.len() >= 2 && points.iter().any(|&p| bounds.contains(p)) {
                        data.roads.push(RoadPolyline { class, points });
                    }
                }
                None => {
                    if let Some(c) = centroid(&points).filter(|&c| bounds.contains(c)) {
                        data.buildings.push(c);
                    }
                }
            }
        }

        log::info!(
            "OSM extract {}: {} roads, {} buildings in bounds",
            self.path.display(),
            data.roads.len(),
            data.buildings.len()
        );
        Ok(data)
    }
}

/// `building=*` values that do not house anyone.
const NON_DWELLING: [&str; 6] = ["no", "shed", "roof", "garage", "kiosk", "toilet"];

fn is_dwelling(value: &str) -> bool {
    !NON_DWELLING.iter().any(|x| value.contains(x))
}

/// Mean of a ring's distinct vertices (closing vertex excluded).
fn centroid(ring: &[GeoPoint]) -> Option<GeoPoint> {
    let open = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    if open.is_empty() {
        return None;
    }
    let n = open.len() as f64;
    let (lat, lon) = open.iter().fold((0.0, 0.0), |(a, b), p| (a + p.lat, b + p.lon));
    Some(GeoPoint::new(lat / n, lon / n))
}
