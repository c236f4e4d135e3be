//! Road and building data sources.
//!
//! The graph is built once at setup from whatever a [`NetworkSource`]
//! returns.  Sources must surface acquisition failures as errors; an empty
//! [`NetworkData`] means the area genuinely has no roads.
//!
//! # CSV format
//!
//! Roads, one row per polyline vertex:
//!
//! ```csv
//! road_id,seq,lat,lon,class
//! 7,0,46.5101,6.6201,residential
//! 7,1,46.5104,6.6209,residential
//! ```
//!
//! Buildings, one centroid per row:
//!
//! ```csv
//! lat,lon
//! 46.5112,6.6230
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use ev_core::{GeoBounds, GeoPoint};

use crate::{GraphError, GraphResult};

// ── RoadClass ─────────────────────────────────────────────────────────────────

/// Drivable road classes.  Everything else (footways, tracks, cycleways) is
/// not part of the evacuation network.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Unclassified,
    Service,
}

impl RoadClass {
    /// Parse an OSM `highway=*` value; `_link` variants map to their parent.
    pub fn from_highway(tag: &str) -> Option<RoadClass> {
        let base = tag.trim().strip_suffix("_link").unwrap_or(tag.trim());
        Some(match base {
            "motorway"     => RoadClass::Motorway,
            "trunk"        => RoadClass::Trunk,
            "primary"      => RoadClass::Primary,
            "secondary"    => RoadClass::Secondary,
            "tertiary"     => RoadClass::Tertiary,
            "residential"  => RoadClass::Residential,
            "unclassified" => RoadClass::Unclassified,
            "service"      => RoadClass::Service,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Motorway     => "motorway",
            RoadClass::Trunk        => "trunk",
            RoadClass::Primary      => "primary",
            RoadClass::Secondary    => "secondary",
            RoadClass::Tertiary     => "tertiary",
            RoadClass::Residential  => "residential",
            RoadClass::Unclassified => "unclassified",
            RoadClass::Service      => "service",
        }
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── NetworkData ───────────────────────────────────────────────────────────────

/// An ordered road geometry with its class.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadPolyline {
    pub class:  RoadClass,
    pub points: Vec<GeoPoint>,
}

/// Everything a source returns for one study area.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkData {
    pub roads:     Vec<RoadPolyline>,
    /// Building centroids, used to weight spawn density.
    pub buildings: Vec<GeoPoint>,
}

impl NetworkData {
    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    /// Number of polyline segments across all roads.
    pub fn segment_count(&self) -> usize {
        self.roads.iter().map(|r| r.points.len().saturating_sub(1)).sum()
    }
}

// ── NetworkSource ─────────────────────────────────────────────────────────────

/// Supplier of road polylines and building centroids.
pub trait NetworkSource {
    /// Fetch the network intersecting `bounds`.
    fn fetch(&self, bounds: &GeoBounds) -> GraphResult<NetworkData>;
}

/// Preloaded data serves itself, unfiltered.
impl NetworkSource for NetworkData {
    fn fetch(&self, _bounds: &GeoBounds) -> GraphResult<NetworkData> {
        Ok(self.clone())
    }
}

// ── CsvNetworkSource ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RoadRecord {
    road_id: u64,
    seq:     u32,
    lat:     f64,
    lon:     f64,
    class:   String,
}

#[derive(Deserialize)]
struct BuildingRecord {
    lat: f64,
    lon: f64,
}

/// Reads roads (and optionally buildings) from CSV files.
///
/// Roads are kept when at least one vertex lies inside the requested
/// bounds; buildings only when they lie inside.
#[derive(Clone, Debug)]
pub struct CsvNetworkSource {
    pub roads_path:     PathBuf,
    pub buildings_path: Option<PathBuf>,
}

impl CsvNetworkSource {
    pub fn new(roads_path: impl Into<PathBuf>) -> Self {
        Self { roads_path: roads_path.into(), buildings_path: None }
    }

    pub fn with_buildings(mut self, path: impl Into<PathBuf>) -> Self {
        self.buildings_path = Some(path.into());
        self
    }
}

impl NetworkSource for CsvNetworkSource {
    fn fetch(&self, bounds: &GeoBounds) -> GraphResult<NetworkData> {
        let roads = read_roads(open(&self.roads_path)?)?
            .into_iter()
            .filter(|r| r.points.iter().any(|&p| bounds.contains(p)))
            .collect();
        let buildings = match &self.buildings_path {
            Some(path) => read_buildings(open(path)?)?
                .into_iter()
                .filter(|&p| bounds.contains(p))
                .collect(),
            None => Vec::new(),
        };
        Ok(NetworkData { roads, buildings })
    }
}

fn open(path: &Path) -> GraphResult<std::fs::File> {
    std::fs::File::open(path).map_err(GraphError::Io)
}

/// Parse road vertices into polylines ordered by `road_id`.
///
/// Rows with an undrivable class are dropped; a road keeps the class of its
/// first row.  Polylines with fewer than two vertices are discarded.
pub fn read_roads<R: Read>(reader: R) -> GraphResult<Vec<RoadPolyline>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut by_road: BTreeMap<u64, (RoadClass, Vec<(u32, GeoPoint)>)> = BTreeMap::new();
    let mut skipped = 0usize;

    for result in csv_reader.deserialize::<RoadRecord>() {
        let row = result.map_err(|e| GraphError::Source(e.to_string()))?;
        let Some(class) = RoadClass::from_highway(&row.class) else {
            skipped += 1;
            continue;
        };
        by_road
            .entry(row.road_id)
            .or_insert_with(|| (class, Vec::new()))
            .1
            .push((row.seq, GeoPoint::new(row.lat, row.lon)));
    }
    if skipped > 0 {
        log::debug!("skipped {skipped} road rows with undrivable classes");
    }

    Ok(by_road
        .into_values()
        .filter_map(|(class, mut pts)| {
            pts.sort_by_key(|&(seq, _)| seq);
            let points: Vec<GeoPoint> = pts.into_iter().map(|(_, p)| p).collect();
            (points.len() >= 2).then_some(RoadPolyline { class, points })
        })
        .collect())
}

/// Parse building centroids.
pub fn read_buildings<R: Read>(reader: R) -> GraphResult<Vec<GeoPoint>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<BuildingRecord>()
        .map(|r| {
            r.map(|b| GeoPoint::new(b.lat, b.lon))
                .map_err(|e| GraphError::Source(e.to_string()))
        })
        .collect()
}
