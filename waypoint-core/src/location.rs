use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::iata::LocationCode;
use crate::{CoreError, CoreResult};

/// Signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> CoreResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::InvalidInput(format!("latitude {} out of range", latitude)));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::InvalidInput(format!("longitude {} out of range", longitude)));
        }
        Ok(Self { latitude, longitude })
    }

    /// Both halves must be present; providers sometimes send one without the other.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Self::new(latitude?, longitude?).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Airport,
    City,
}

impl LocationKind {
    /// Provider `subType` spelling.
    pub fn as_provider_str(&self) -> &'static str {
        match self {
            LocationKind::Airport => "AIRPORT",
            LocationKind::City => "CITY",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Airport => "airport",
            LocationKind::City => "city",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "airport" => Ok(LocationKind::Airport),
            "city" => Ok(LocationKind::City),
            other => Err(CoreError::InvalidInput(format!("unknown location kind '{}'", other))),
        }
    }
}

/// A resolved place. Only ever persisted with both coordinates present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub code: LocationCode,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub kind: LocationKind,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn map_point(&self) -> MapPoint {
        MapPoint {
            code: self.code.clone(),
            name: self.name.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Ranked row of a free-text location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCandidate {
    pub code: String,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<LocationKind>,
    pub relevance: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationCandidate {
    /// Converts to a storable Location if the code is well formed and both
    /// coordinates are present.
    pub fn to_location(&self, updated_at: DateTime<Utc>) -> Option<Location> {
        let code = LocationCode::parse(&self.code).ok()?;
        let coordinate = Coordinate::from_parts(self.latitude, self.longitude)?;

        Some(Location {
            code,
            name: self.name.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            country_code: self.country_code.clone(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            kind: self.kind.unwrap_or(LocationKind::Airport),
            updated_at,
        })
    }
}

/// A labelled point on a map payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    pub code: LocationCode,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl MapPoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(lat: Option<f64>, lon: Option<f64>) -> LocationCandidate {
        LocationCandidate {
            code: "cdg".to_string(),
            name: "CHARLES DE GAULLE".to_string(),
            city: Some("PARIS".to_string()),
            country: Some("FRANCE".to_string()),
            country_code: Some("FR".to_string()),
            kind: Some(LocationKind::Airport),
            relevance: 70.0,
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_candidate_without_both_coordinates_is_not_storable() {
        let now = Utc::now();
        assert!(candidate(Some(49.0), None).to_location(now).is_none());
        assert!(candidate(None, Some(2.5)).to_location(now).is_none());

        let location = candidate(Some(49.0097), Some(2.5479)).to_location(now).unwrap();
        assert_eq!(location.code.as_str(), "CDG");
        assert_eq!(location.coordinate(), Coordinate { latitude: 49.0097, longitude: 2.5479 });
    }

    #[test]
    fn test_coordinate_range() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("AIRPORT".parse::<LocationKind>().unwrap(), LocationKind::Airport);
        assert_eq!("city".parse::<LocationKind>().unwrap(), LocationKind::City);
        assert!("station".parse::<LocationKind>().is_err());
    }
}
