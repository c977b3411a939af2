use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo::{self, BoundingRegion};
use crate::location::{Coordinate, MapPoint};
use crate::provider::{
    FlightOfferQuery, HotelOfferQuery, ProviderEndpoint, ProviderFlightOffer, ProviderHotelOffer,
    ProviderHotelOffers, ProviderSegment,
};

// ============================================================================
// Flight search
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchRequest {
    pub origin_location_code: Option<String>,
    pub destination_location_code: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub infants: Option<u32>,
    pub travel_class: Option<String>,
    pub non_stop: Option<bool>,
    pub max_price: Option<f64>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchResult {
    pub flights: Vec<FlightOffer>,
    pub meta: Option<Value>,
    pub search_params: FlightOfferQuery,
    pub map_data: Option<RouteMap>,
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub price: OfferPrice,
    pub itineraries: Vec<Itinerary>,
    pub traveler_pricings: Option<Value>,
    pub validating_airline_codes: Vec<String>,
    pub last_ticketing_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferPrice {
    pub total: String,
    pub currency: String,
    pub base: Option<String>,
    pub taxes: Vec<Tax>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tax {
    pub amount: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub duration: Option<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: SegmentEndpoint,
    pub arrival: SegmentEndpoint,
    pub carrier_code: String,
    pub number: String,
    pub aircraft: Option<String>,
    pub duration: Option<String>,
    pub number_of_stops: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEndpoint {
    pub iata_code: String,
    pub terminal: Option<String>,
    pub at: String,
}

impl From<ProviderEndpoint> for SegmentEndpoint {
    fn from(e: ProviderEndpoint) -> Self {
        Self {
            iata_code: e.iata_code,
            terminal: e.terminal,
            at: e.at,
        }
    }
}

impl From<ProviderSegment> for Segment {
    fn from(s: ProviderSegment) -> Self {
        Self {
            departure: s.departure.into(),
            arrival: s.arrival.into(),
            carrier_code: s.carrier_code,
            number: s.number,
            aircraft: s.aircraft.and_then(|a| a.code),
            duration: s.duration,
            number_of_stops: s.number_of_stops.unwrap_or(0),
        }
    }
}

impl From<ProviderFlightOffer> for FlightOffer {
    fn from(offer: ProviderFlightOffer) -> Self {
        Self {
            id: offer.id,
            price: OfferPrice {
                total: offer.price.total,
                currency: offer.price.currency,
                base: offer.price.base,
                taxes: offer
                    .price
                    .taxes
                    .unwrap_or_default()
                    .into_iter()
                    .map(|t| Tax { amount: t.amount, code: t.code })
                    .collect(),
            },
            itineraries: offer
                .itineraries
                .into_iter()
                .map(|it| Itinerary {
                    duration: it.duration,
                    segments: it.segments.into_iter().map(Segment::from).collect(),
                })
                .collect(),
            traveler_pricings: offer.traveler_pricings,
            validating_airline_codes: offer.validating_airline_codes.unwrap_or_default(),
            last_ticketing_date: offer.last_ticketing_date,
        }
    }
}

/// Origin/destination pair for a route map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMap {
    pub origin: MapPoint,
    pub destination: MapPoint,
    pub distance_km: u32,
    pub bounds: BoundingRegion,
}

impl RouteMap {
    pub fn between(origin: MapPoint, destination: MapPoint) -> Self {
        let a = origin.coordinate();
        let b = destination.coordinate();
        Self {
            distance_km: geo::distance_km(a, b),
            bounds: geo::bounds_including(a, &[b]),
            origin,
            destination,
        }
    }
}

// ============================================================================
// Hotel search
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchRequest {
    pub city_code: Option<String>,
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
    pub adults: Option<u32>,
    pub rooms: Option<u32>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchParams {
    pub city_code: String,
    #[serde(flatten)]
    pub query: HotelOfferQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchResult {
    pub hotels: Vec<Hotel>,
    pub search_params: HotelSearchParams,
    pub map_data: HotelMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub hotel_id: String,
    pub name: String,
    pub rating: Option<String>,
    pub contact: Option<Value>,
    pub address: Option<Value>,
    pub description: Option<Value>,
    pub amenities: Vec<String>,
    pub media: Option<Value>,
    pub geo_code: Option<Coordinate>,
    pub offers: Vec<ProviderHotelOffer>,
}

impl From<ProviderHotelOffers> for Hotel {
    fn from(entry: ProviderHotelOffers) -> Self {
        let geo_code = entry.hotel.coordinate();
        let hotel = entry.hotel;
        Self {
            hotel_id: hotel.hotel_id,
            name: hotel.name,
            rating: hotel.rating,
            contact: hotel.contact,
            address: hotel.address,
            description: hotel.description,
            amenities: hotel.amenities.unwrap_or_default(),
            media: hotel.media,
            geo_code,
            offers: entry.offers.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelMap {
    pub city: Option<MapPoint>,
    pub hotels: Vec<HotelMarker>,
    pub bounds: Option<BoundingRegion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelMarker {
    pub hotel_id: String,
    pub name: String,
    pub rating: Option<String>,
    pub coordinates: Coordinate,
    pub address: Option<Value>,
}

impl Hotel {
    /// Marker from the hotel's own provider geocode, if it has one.
    pub fn marker(&self) -> Option<HotelMarker> {
        Some(HotelMarker {
            hotel_id: self.hotel_id.clone(),
            name: self.name.clone(),
            rating: self.rating.clone(),
            coordinates: self.geo_code?,
            address: self.address.clone(),
        })
    }
}
