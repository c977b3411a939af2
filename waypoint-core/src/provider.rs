use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::iata::LocationCode;
use crate::location::{Coordinate, LocationCandidate, LocationKind};
use crate::CoreResult;

// ============================================================================
// Provider-native reference data
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLocation {
    pub iata_code: Option<String>,
    #[serde(default)]
    pub name: String,
    pub sub_type: Option<String>,
    pub address: Option<ProviderAddress>,
    pub geo_code: Option<GeoCode>,
    pub analytics: Option<Analytics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAddress {
    pub city_name: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GeoCode {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analytics {
    pub travelers: Option<TravelerAnalytics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelerAnalytics {
    pub score: Option<f64>,
}

impl ProviderLocation {
    pub fn kind(&self) -> Option<LocationKind> {
        self.sub_type.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        let geo = self.geo_code?;
        Coordinate::from_parts(geo.latitude, geo.longitude)
    }

    pub fn to_candidate(&self) -> LocationCandidate {
        let address = self.address.clone().unwrap_or_default();
        let geo = self.geo_code.unwrap_or_default();

        LocationCandidate {
            code: self.iata_code.clone().unwrap_or_default().to_ascii_uppercase(),
            name: self.name.clone(),
            city: address.city_name,
            country: address.country_name,
            country_code: address.country_code,
            kind: self.kind(),
            relevance: self
                .analytics
                .as_ref()
                .and_then(|a| a.travelers.as_ref())
                .and_then(|t| t.score)
                .unwrap_or(0.0),
            latitude: geo.latitude,
            longitude: geo.longitude,
        }
    }
}

// ============================================================================
// Flight offers
// ============================================================================

/// Flight offer search parameters as sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOfferQuery {
    pub origin_location_code: String,
    pub destination_location_code: String,
    pub departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    pub adults: u32,
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub children: u32,
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub infants: u32,
    pub travel_class: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    #[serde(default)]
    pub non_stop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    pub currency_code: String,
    pub max: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightOffersPage {
    #[serde(default)]
    pub data: Vec<ProviderFlightOffer>,
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFlightOffer {
    pub id: String,
    pub price: ProviderPrice,
    #[serde(default)]
    pub itineraries: Vec<ProviderItinerary>,
    pub traveler_pricings: Option<Value>,
    pub validating_airline_codes: Option<Vec<String>>,
    pub last_ticketing_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPrice {
    pub total: String,
    pub currency: String,
    pub base: Option<String>,
    pub taxes: Option<Vec<ProviderTax>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTax {
    pub amount: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderItinerary {
    pub duration: Option<String>,
    #[serde(default)]
    pub segments: Vec<ProviderSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSegment {
    pub departure: ProviderEndpoint,
    pub arrival: ProviderEndpoint,
    pub carrier_code: String,
    pub number: String,
    pub aircraft: Option<ProviderAircraft>,
    pub duration: Option<String>,
    pub number_of_stops: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEndpoint {
    pub iata_code: String,
    pub terminal: Option<String>,
    pub at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAircraft {
    pub code: Option<String>,
}

// ============================================================================
// Hotel offers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOfferQuery {
    pub check_in_date: String,
    pub check_out_date: String,
    pub adults: u32,
    pub room_quantity: u32,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHotelOffers {
    pub hotel: ProviderHotel,
    pub offers: Option<Vec<ProviderHotelOffer>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHotel {
    pub hotel_id: String,
    #[serde(default)]
    pub name: String,
    pub rating: Option<String>,
    pub contact: Option<Value>,
    pub address: Option<Value>,
    pub description: Option<Value>,
    pub amenities: Option<Vec<String>>,
    pub media: Option<Value>,
    pub geo_code: Option<GeoCode>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ProviderHotel {
    /// Some provider versions nest coordinates under `geoCode`, others put
    /// them on the hotel itself.
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.geo_code
            .and_then(|g| Coordinate::from_parts(g.latitude, g.longitude))
            .or_else(|| Coordinate::from_parts(self.latitude, self.longitude))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHotelOffer {
    pub id: String,
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
    pub room_quantity: Option<Value>,
    pub rate_code: Option<String>,
    pub rate_family_estimated: Option<Value>,
    pub category: Option<String>,
    pub description: Option<Value>,
    pub board_type: Option<String>,
    pub room: Option<Value>,
    pub guests: Option<Value>,
    pub price: Option<Value>,
    pub policies: Option<Value>,
}

// ============================================================================
// Provider contract
// ============================================================================

/// External travel API. Implementations convert their transport errors to
/// `CoreError::UpstreamUnavailable`.
#[async_trait]
pub trait TravelProvider: Send + Sync {
    async fn find_locations(
        &self,
        keyword: &str,
        kinds: &[LocationKind],
    ) -> CoreResult<Vec<ProviderLocation>>;

    /// Exact (case-insensitive) code match among airport/city candidates.
    async fn find_location_by_code(
        &self,
        code: &LocationCode,
    ) -> CoreResult<Option<ProviderLocation>> {
        let candidates = self
            .find_locations(code.as_str(), &[LocationKind::Airport, LocationKind::City])
            .await?;

        Ok(candidates.into_iter().find(|c| {
            c.iata_code
                .as_deref()
                .map(|iata| code.matches(iata))
                .unwrap_or(false)
        }))
    }

    async fn search_flight_offers(&self, query: &FlightOfferQuery) -> CoreResult<FlightOffersPage>;

    async fn list_hotels_by_city(&self, city_code: &LocationCode) -> CoreResult<Vec<String>>;

    async fn search_hotel_offers(
        &self,
        hotel_ids: &[String],
        query: &HotelOfferQuery,
    ) -> CoreResult<Vec<ProviderHotelOffers>>;
}
