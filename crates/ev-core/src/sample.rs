//! Grid sampling results that keep out-of-bounds reads distinguishable.

/// The outcome of reading a gridded field (elevation raster, flood grid) at
/// an arbitrary position.
///
/// Reads outside the grid still produce a usable value (the nearest
/// in-bounds cell), but callers can tell it apart from a genuine reading.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GridSample<T> {
    /// The position lies inside the grid.
    Inside(T),
    /// The position lies outside; `fallback` is the nearest clamped value.
    OutOfBounds { fallback: T },
}

impl<T: Copy> GridSample<T> {
    /// The reading, whether genuine or clamped.
    #[inline]
    pub fn value(self) -> T {
        match self {
            GridSample::Inside(v) => v,
            GridSample::OutOfBounds { fallback } => fallback,
        }
    }

    /// The reading only if it is genuine.
    #[inline]
    pub fn inside(self) -> Option<T> {
        match self {
            GridSample::Inside(v) => Some(v),
            GridSample::OutOfBounds { .. } => None,
        }
    }

    #[inline]
    pub fn is_out_of_bounds(self) -> bool {
        matches!(self, GridSample::OutOfBounds { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GridSample<U> {
        match self {
            GridSample::Inside(v) => GridSample::Inside(f(v)),
            GridSample::OutOfBounds { fallback } => GridSample::OutOfBounds { fallback: f(fallback) },
        }
    }
}
