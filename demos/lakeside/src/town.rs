//! Synthetic lakeside town.
//!
//! A street lattice on a slope that rises eastward from a lake shore.  The
//! western columns sit a metre or two above the water line, the eastern ridge
//! about thirty metres up.

use ev_core::{CoreResult, ElevationRaster, GeoBounds, GeoPoint};
use ev_network::{NetworkData, RoadClass, RoadPolyline};

const STREET_COLUMNS: usize = 8;
const STREET_ROWS:    usize = 6;
const RIDGE_HEIGHT_M: f32   = 30.0;
const SHORE_HEIGHT_M: f32   = 1.0;

pub fn bounds() -> CoreResult<GeoBounds> {
    GeoBounds::new(-88.060, 30.680, -88.040, 30.695)
}

/// Terrain raster: a convex slope in longitude with a shallow ripple in
/// latitude, so water pools in a few southern pockets before climbing.
pub fn elevation(bounds: &GeoBounds) -> CoreResult<ElevationRaster> {
    let (min_lon, min_lat) = (bounds.min_lon, bounds.min_lat);
    let (w, h) = (bounds.width_deg(), bounds.height_deg());
    ElevationRaster::from_fn(*bounds, 128, 96, move |lat, lon| {
        let east = ((lon - min_lon) / w).clamp(0.0, 1.0) as f32;
        let north = ((lat - min_lat) / h).clamp(0.0, 1.0) as f32;
        let ripple = (north * std::f32::consts::TAU * 1.5).sin() * 0.8;
        SHORE_HEIGHT_M + RIDGE_HEIGHT_M * east.powf(1.5) + ripple
    })
}

/// Street lattice plus building centroids.
///
/// Avenues (north-south) are secondary roads, cross streets residential.
/// Blocks nearer the shore are denser.
pub fn network(bounds: &GeoBounds) -> NetworkData {
    // Keep the lattice off the raster edge.
    let inset_lon = bounds.width_deg() * 0.05;
    let inset_lat = bounds.height_deg() * 0.05;
    let lon_at = |c: usize| {
        bounds.min_lon + inset_lon + (bounds.width_deg() - 2.0 * inset_lon) * c as f64 / (STREET_COLUMNS - 1) as f64
    };
    let lat_at = |r: usize| {
        bounds.min_lat + inset_lat + (bounds.height_deg() - 2.0 * inset_lat) * r as f64 / (STREET_ROWS - 1) as f64
    };

    let mut roads = Vec::with_capacity(STREET_COLUMNS + STREET_ROWS);
    for c in 0..STREET_COLUMNS {
        roads.push(RoadPolyline {
            class:  RoadClass::Secondary,
            points: (0..STREET_ROWS).map(|r| GeoPoint::new(lat_at(r), lon_at(c))).collect(),
        });
    }
    for r in 0..STREET_ROWS {
        roads.push(RoadPolyline {
            class:  RoadClass::Residential,
            points: (0..STREET_COLUMNS).map(|c| GeoPoint::new(lat_at(r), lon_at(c))).collect(),
        });
    }

    let mut buildings = Vec::new();
    for c in 0..STREET_COLUMNS - 1 {
        for r in 0..STREET_ROWS - 1 {
            let (lon0, lon1) = (lon_at(c), lon_at(c + 1));
            let (lat0, lat1) = (lat_at(r), lat_at(r + 1));
            let per_block = STREET_COLUMNS - 1 - c + (r * 3 + c) % 3;
            for k in 0..per_block {
                let fx = 0.2 + 0.6 * ((k * 7 + r) % per_block) as f64 / per_block as f64;
                let fy = 0.2 + 0.6 * k as f64 / per_block as f64;
                buildings.push(GeoPoint::new(lat0 + (lat1 - lat0) * fy, lon0 + (lon1 - lon0) * fx));
            }
        }
    }

    NetworkData { roads, buildings }
}
