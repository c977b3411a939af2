use std::sync::Arc;
use tracing::{debug, info};
use waypoint_core::geo;
use waypoint_core::provider::{HotelOfferQuery, TravelProvider};
use waypoint_core::search::{
    Hotel, HotelMap, HotelMarker, HotelSearchParams, HotelSearchRequest, HotelSearchResult,
};
use waypoint_core::{CoreError, CoreResult, LocationCode};

use crate::cache_aside::{CacheAside, Fingerprint};
use crate::flights::{parse_date, required, DEFAULT_CURRENCY};
use crate::resolver::LocationResolver;

/// Upper bound on hotel ids sent to the offers endpoint in one call.
pub const MAX_HOTEL_IDS: usize = 50;

pub const NO_HOTELS_MESSAGE: &str = "No hotels found for this city";

pub struct HotelSearch {
    provider: Arc<dyn TravelProvider>,
    resolver: Arc<LocationResolver>,
    cache: CacheAside,
    ttl_seconds: u64,
}

impl HotelSearch {
    pub fn new(
        provider: Arc<dyn TravelProvider>,
        resolver: Arc<LocationResolver>,
        cache: CacheAside,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            provider,
            resolver,
            cache,
            ttl_seconds,
        }
    }

    pub async fn search(&self, request: HotelSearchRequest) -> CoreResult<HotelSearchResult> {
        let (city, params) = normalize(request)?;
        let key = Fingerprint::new("hotels")
            .part(&params.city_code)
            .part(&params.query.check_in_date)
            .part(&params.query.check_out_date)
            .part(params.query.adults)
            .part(params.query.room_quantity)
            .part(&params.query.currency);

        let outcome = self
            .cache
            .get_or_fetch(&key, self.ttl_seconds, || self.fetch(&city, params.clone()))
            .await?;

        debug!(key = %key, cached = outcome.cached, "Hotel search complete");
        let mut result = outcome.value;
        result.cached = outcome.cached;
        Ok(result)
    }

    async fn fetch(&self, city: &LocationCode, params: HotelSearchParams) -> CoreResult<HotelSearchResult> {
        let mut hotel_ids = self.provider.list_hotels_by_city(city).await?;
        if hotel_ids.is_empty() {
            info!(city = %city, "No hotels listed for city");
            return Ok(HotelSearchResult {
                hotels: Vec::new(),
                search_params: params,
                map_data: HotelMap::default(),
                message: Some(NO_HOTELS_MESSAGE.to_string()),
                cached: false,
            });
        }
        hotel_ids.truncate(MAX_HOTEL_IDS);

        let (offers, city_point) = tokio::join!(
            self.provider.search_hotel_offers(&hotel_ids, &params.query),
            self.resolver.map_point(city)
        );

        let hotels: Vec<Hotel> = offers?
            .into_iter()
            .map(Hotel::from)
            .filter(|h| !h.offers.is_empty())
            .collect();
        info!(city = %city, listed = hotel_ids.len(), with_offers = hotels.len(), "Hotel offers fetched");

        let markers: Vec<HotelMarker> = hotels.iter().filter_map(Hotel::marker).collect();
        let mut points: Vec<_> = markers.iter().map(|m| m.coordinates).collect();
        if points.is_empty() {
            if let Some(point) = &city_point {
                points.push(point.coordinate());
            }
        }

        Ok(HotelSearchResult {
            hotels,
            search_params: params,
            map_data: HotelMap {
                city: city_point,
                hotels: markers,
                bounds: geo::bounds_of(&points),
            },
            message: None,
            cached: false,
        })
    }
}

fn normalize(request: HotelSearchRequest) -> CoreResult<(LocationCode, HotelSearchParams)> {
    let city = LocationCode::parse(&required(request.city_code, "cityCode")?)?;
    let check_in = parse_date(&required(request.check_in_date, "checkInDate")?, "checkInDate")?;
    let check_out = parse_date(&required(request.check_out_date, "checkOutDate")?, "checkOutDate")?;
    if check_out <= check_in {
        return Err(CoreError::InvalidInput(
            "checkOutDate must be after checkInDate".to_string(),
        ));
    }

    let adults = request.adults.unwrap_or(1);
    let rooms = request.rooms.unwrap_or(1);
    if adults == 0 || rooms == 0 {
        return Err(CoreError::InvalidInput("adults and rooms must be at least 1".to_string()));
    }

    let params = HotelSearchParams {
        city_code: city.to_string(),
        query: HotelOfferQuery {
            check_in_date: check_in.to_string(),
            check_out_date: check_out.to_string(),
            adults,
            room_quantity: rooms,
            currency: request
                .currency
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        },
    };

    Ok((city, params))
}
