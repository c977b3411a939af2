use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Fraction of the span added on each side of a multi-point region.
pub const BOUNDS_PADDING: f64 = 0.1;

/// Half-width, in degrees, of the viewport used for a single point
/// (roughly a city-level zoom).
pub const SINGLE_POINT_SPAN_DEGREES: f64 = 0.05;

/// Great-circle distance via the haversine formula, rounded to the nearest km.
pub fn distance_km(a: Coordinate, b: Coordinate) -> u32 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding error can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (EARTH_RADIUS_KM * c).round() as u32
}

/// Axis-aligned lat/long rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingRegion {
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            latitude: (self.south + self.north) / 2.0,
            longitude: (self.west + self.east) / 2.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.north <= self.south || self.east <= self.west
    }
}

/// Smallest rectangle containing every point, padded for rendering.
///
/// A single point (or a set of identical points) gets a fixed viewport
/// centred on it instead of a zero-area rectangle. Returns `None` for an
/// empty input.
pub fn bounds_of(coordinates: &[Coordinate]) -> Option<BoundingRegion> {
    let (first, rest) = coordinates.split_first()?;
    Some(bounds_including(*first, rest))
}

/// Non-empty form of [`bounds_of`].
pub fn bounds_including(first: Coordinate, rest: &[Coordinate]) -> BoundingRegion {
    let mut south = first.latitude;
    let mut north = first.latitude;
    let mut west = first.longitude;
    let mut east = first.longitude;

    for c in rest {
        south = south.min(c.latitude);
        north = north.max(c.latitude);
        west = west.min(c.longitude);
        east = east.max(c.longitude);
    }

    let (south, north) = pad_axis(south, north, 90.0);
    let (west, east) = pad_axis(west, east, 180.0);

    BoundingRegion { south, west, north, east }
}

fn pad_axis(min: f64, max: f64, limit: f64) -> (f64, f64) {
    let span = max - min;
    if span > 0.0 {
        let pad = span * BOUNDS_PADDING;
        return ((min - pad).max(-limit), (max + pad).min(limit));
    }

    // Fixed window around a single value. Within one span of the pole or the
    // antimeridian the window slides inward so it keeps its full size; it
    // still contains the point but is no longer centred on it.
    let center = min.clamp(
        -limit + SINGLE_POINT_SPAN_DEGREES,
        limit - SINGLE_POINT_SPAN_DEGREES,
    );
    (
        (center - SINGLE_POINT_SPAN_DEGREES).max(-limit),
        (center + SINGLE_POINT_SPAN_DEGREES).min(limit),
    )
}
