//! Geographic coordinates and the local planar projection.
//!
//! Data sources hand over WGS-84 latitude/longitude.  Everything inside the
//! simulation works in a local east/north metre frame centred on the study
//! area, produced by [`LocalProjection`]: an equirectangular approximation
//! that is accurate to well under a metre across a few kilometres.

use glam::{Vec2, Vec3};

use crate::{CoreError, CoreResult};

/// Metres per degree of latitude.
const METRES_PER_DEG_LAT: f64 = 111_132.0;
/// Metres per degree of longitude at the equator.
const METRES_PER_DEG_LON_EQ: f64 = 111_320.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Axis-aligned lat/lon bounding box of the study area.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Build bounds, rejecting empty or inverted boxes.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> CoreResult<Self> {
        let ok = min_lon.is_finite()
            && min_lat.is_finite()
            && max_lon.is_finite()
            && max_lat.is_finite()
            && max_lon > min_lon
            && max_lat > min_lat;
        if !ok {
            return Err(CoreError::DegenerateBounds(format!(
                "[{min_lon}, {min_lat}, {max_lon}, {max_lat}]"
            )));
        }
        Ok(Self { min_lon, min_lat, max_lon, max_lat })
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) * 0.5,
            (self.min_lon + self.max_lon) * 0.5,
        )
    }

    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lon..=self.max_lon).contains(&p.lon)
    }

    pub fn width_deg(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height_deg(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// Equirectangular projection about the centre of a [`GeoBounds`].
///
/// `project` returns planar `(x, z)` metres; `x` grows east and `z` grows
/// north.  The longitude scale is fixed at the centre latitude.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalProjection {
    center:    GeoPoint,
    lon_scale: f64,
    lat_scale: f64,
}

impl LocalProjection {
    pub fn new(bounds: &GeoBounds) -> Self {
        let center = bounds.center();
        Self {
            center,
            lon_scale: METRES_PER_DEG_LON_EQ * center.lat.to_radians().cos(),
            lat_scale: METRES_PER_DEG_LAT,
        }
    }

    /// Planar `(x, z)` metres of `p` relative to the centre.
    #[inline]
    pub fn project(&self, p: GeoPoint) -> Vec2 {
        Vec2::new(
            ((p.lon - self.center.lon) * self.lon_scale) as f32,
            ((p.lat - self.center.lat) * self.lat_scale) as f32,
        )
    }

    /// Project and lift to 3D with the given height.
    #[inline]
    pub fn project_with_height(&self, p: GeoPoint, height: f32) -> Vec3 {
        let xz = self.project(p);
        Vec3::new(xz.x, height, xz.y)
    }

    /// Inverse of [`project`](Self::project).
    #[inline]
    pub fn unproject(&self, xz: Vec2) -> GeoPoint {
        GeoPoint::new(
            self.center.lat + xz.y as f64 / self.lat_scale,
            self.center.lon + xz.x as f64 / self.lon_scale,
        )
    }

    /// Planar extent of `bounds` as `(min, max)` corners in metres.
    pub fn extent(&self, bounds: &GeoBounds) -> (Vec2, Vec2) {
        let min = self.project(GeoPoint::new(bounds.min_lat, bounds.min_lon));
        let max = self.project(GeoPoint::new(bounds.max_lat, bounds.max_lon));
        (min, max)
    }
}
