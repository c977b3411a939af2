use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};
use waypoint_core::provider::{FlightOfferQuery, TravelProvider};
use waypoint_core::search::{FlightOffer, FlightSearchRequest, FlightSearchResult, RouteMap};
use waypoint_core::{CoreError, CoreResult, LocationCode};

use crate::cache_aside::{CacheAside, Fingerprint};
use crate::resolver::LocationResolver;

pub const MAX_FLIGHT_OFFERS: u32 = 50;
pub const DEFAULT_TRAVEL_CLASS: &str = "ECONOMY";
pub const DEFAULT_CURRENCY: &str = "EUR";

const TRAVEL_CLASSES: [&str; 4] = ["ECONOMY", "PREMIUM_ECONOMY", "BUSINESS", "FIRST"];

pub struct FlightSearch {
    provider: Arc<dyn TravelProvider>,
    resolver: Arc<LocationResolver>,
    cache: CacheAside,
    ttl_seconds: u64,
}

impl FlightSearch {
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

    pub async fn search(&self, request: FlightSearchRequest) -> CoreResult<FlightSearchResult> {
        let (origin, destination, query) = normalize(request)?;
        let key = fingerprint(&query);

        let outcome = self
            .cache
            .get_or_fetch(&key, self.ttl_seconds, || async {
                let page = self.provider.search_flight_offers(&query).await?;
                let flights: Vec<FlightOffer> = page.data.into_iter().map(FlightOffer::from).collect();
                info!(
                    origin = %origin,
                    destination = %destination,
                    offers = flights.len(),
                    "Flight offers fetched"
                );

                let (from, to) = tokio::join!(
                    self.resolver.map_point(&origin),
                    self.resolver.map_point(&destination)
                );
                let map_data = match (from, to) {
                    (Some(from), Some(to)) => Some(RouteMap::between(from, to)),
                    _ => None,
                };

                Ok(FlightSearchResult {
                    flights,
                    meta: page.meta,
                    search_params: query.clone(),
                    map_data,
                    cached: false,
                })
            })
            .await?;

        debug!(key = %key, cached = outcome.cached, "Flight search complete");
        let mut result = outcome.value;
        result.cached = outcome.cached;
        Ok(result)
    }
}

/// Cache key covering every parameter that changes the provider's answer.
fn fingerprint(query: &FlightOfferQuery) -> Fingerprint {
    Fingerprint::new("flights")
        .part(&query.origin_location_code)
        .part(&query.destination_location_code)
        .part(&query.departure_date)
        .opt_part(query.return_date.as_deref(), "oneway")
        .part(query.adults)
        .part(&query.travel_class)
        .part(query.children)
        .part(query.infants)
        .part(if query.non_stop { "nonstop" } else { "any" })
        .opt_part(query.max_price, "nomax")
        .part(&query.currency_code)
}

fn normalize(request: FlightSearchRequest) -> CoreResult<(LocationCode, LocationCode, FlightOfferQuery)> {
    let origin = required(request.origin_location_code, "originLocationCode")?;
    let destination = required(request.destination_location_code, "destinationLocationCode")?;
    let departure_date = required(request.departure_date, "departureDate")?;

    let origin = LocationCode::parse(&origin)?;
    let destination = LocationCode::parse(&destination)?;

    let departure = parse_date(&departure_date, "departureDate")?;
    let return_date = match request.return_date.filter(|d| !d.trim().is_empty()) {
        Some(raw) => {
            let ret = parse_date(&raw, "returnDate")?;
            if ret < departure {
                return Err(CoreError::InvalidInput(
                    "returnDate must not be before departureDate".to_string(),
                ));
            }
            Some(ret.to_string())
        }
        None => None,
    };

    let adults = request.adults.unwrap_or(1);
    if adults == 0 {
        return Err(CoreError::InvalidInput("adults must be at least 1".to_string()));
    }

    let travel_class = request
        .travel_class
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_TRAVEL_CLASS.to_string());
    if !TRAVEL_CLASSES.contains(&travel_class.as_str()) {
        return Err(CoreError::InvalidInput(format!("unknown travelClass '{}'", travel_class)));
    }

    if let Some(max_price) = request.max_price {
        if !max_price.is_finite() || max_price <= 0.0 {
            return Err(CoreError::InvalidInput("maxPrice must be positive".to_string()));
        }
    }

    let query = FlightOfferQuery {
        origin_location_code: origin.to_string(),
        destination_location_code: destination.to_string(),
        departure_date: departure.to_string(),
        return_date,
        adults,
        children: request.children.unwrap_or(0),
        infants: request.infants.unwrap_or(0),
        travel_class,
        non_stop: request.non_stop.unwrap_or(false),
        max_price: request.max_price,
        currency_code: request
            .currency_code
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        max: MAX_FLIGHT_OFFERS,
    };

    Ok((origin, destination, query))
}

pub(crate) fn required(value: Option<String>, name: &'static str) -> CoreResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(CoreError::MissingParameter(name))
}

pub(crate) fn parse_date(raw: &str, name: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidInput(format!("{} must be a YYYY-MM-DD date", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stored_location, FakeProvider, RecordingStore};
    use std::sync::atomic::Ordering;
    use waypoint_core::provider::{
        FlightOffersPage, ProviderEndpoint, ProviderFlightOffer, ProviderItinerary, ProviderPrice,
        ProviderSegment,
    };
    use waypoint_store::MemoryResultCache;

    fn offer(id: &str, total: &str) -> ProviderFlightOffer {
        ProviderFlightOffer {
            id: id.to_string(),
            price: ProviderPrice {
                total: total.to_string(),
                currency: "EUR".to_string(),
                base: None,
                taxes: None,
            },
            itineraries: vec![ProviderItinerary {
                duration: Some("PT7H20M".to_string()),
                segments: vec![ProviderSegment {
                    departure: ProviderEndpoint {
                        iata_code: "JFK".to_string(),
                        terminal: Some("7".to_string()),
                        at: "2025-03-01T18:00:00".to_string(),
                    },
                    arrival: ProviderEndpoint {
                        iata_code: "LHR".to_string(),
                        terminal: None,
                        at: "2025-03-02T06:20:00".to_string(),
                    },
                    carrier_code: "BA".to_string(),
                    number: "178".to_string(),
                    aircraft: None,
                    duration: Some("PT7H20M".to_string()),
                    number_of_stops: Some(0),
                }],
            }],
            traveler_pricings: None,
            validating_airline_codes: Some(vec!["BA".to_string()]),
            last_ticketing_date: None,
        }
    }

    async fn setup(seed_lhr: bool) -> (FlightSearch, Arc<FakeProvider>) {
        let store = Arc::new(RecordingStore::default());
        store.seed(stored_location("JFK", 40.6413, -73.7781)).await;
        if seed_lhr {
            store.seed(stored_location("LHR", 51.4700, -0.4543)).await;
        }

        let provider = Arc::new(FakeProvider {
            flight_page: FlightOffersPage {
                data: vec![offer("1", "412.30"), offer("2", "530.00")],
                meta: Some(serde_json::json!({ "count": 2 })),
            },
            ..Default::default()
        });
        let cache = CacheAside::new(Arc::new(MemoryResultCache::new(64)));
        let resolver = Arc::new(LocationResolver::new(store, provider.clone(), cache.clone(), 60));

        (FlightSearch::new(provider.clone(), resolver, cache, 900), provider)
    }

    fn request() -> FlightSearchRequest {
        FlightSearchRequest {
            origin_location_code: Some("jfk".to_string()),
            destination_location_code: Some("LHR".to_string()),
            departure_date: Some("2025-03-01".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_normalizes_and_maps() {
        let (search, provider) = setup(true).await;

        let result = search.search(request()).await.unwrap();

        assert!(!result.cached);
        assert_eq!(result.flights.len(), 2);
        assert_eq!(result.flights[0].price.total, "412.30");
        assert_eq!(result.search_params.origin_location_code, "JFK");
        assert_eq!(result.search_params.adults, 1);
        assert_eq!(result.search_params.travel_class, "ECONOMY");
        assert_eq!(result.search_params.currency_code, "EUR");

        let map = result.map_data.unwrap();
        assert_eq!(map.distance_km, 5540);
        assert_eq!(map.destination.code.as_str(), "LHR");

        let queries = provider.flight_queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].max, MAX_FLIGHT_OFFERS);
    }

    #[tokio::test]
    async fn test_repeat_search_served_from_cache() {
        let (search, provider) = setup(true).await;

        let first = search.search(request()).await.unwrap();
        let second = search.search(request()).await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.flights.len(), first.flights.len());
        assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 1);

        // A different passenger mix is a different search
        let mut other = request();
        other.children = Some(1);
        assert!(!search.search(other).await.unwrap().cached);
        assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_destination_yields_null_map() {
        let (search, _provider) = setup(false).await;

        let result = search.search(request()).await.unwrap();
        assert_eq!(result.flights.len(), 2);
        assert!(result.map_data.is_none());
    }

    #[tokio::test]
    async fn test_missing_parameters_rejected_before_provider() {
        let (search, provider) = setup(true).await;

        let mut req = request();
        req.departure_date = None;
        let err = search.search(req).await.unwrap_err();
        assert_eq!(err, CoreError::MissingParameter("departureDate"));

        let mut req = request();
        req.origin_location_code = Some("  ".to_string());
        let err = search.search(req).await.unwrap_err();
        assert_eq!(err, CoreError::MissingParameter("originLocationCode"));

        let mut req = request();
        req.departure_date = Some("01/03/2025".to_string());
        assert!(matches!(search.search(req).await, Err(CoreError::InvalidInput(_))));

        let mut req = request();
        req.return_date = Some("2025-02-01".to_string());
        assert!(matches!(search.search(req).await, Err(CoreError::InvalidInput(_))));

        let mut req = request();
        req.adults = Some(0);
        assert!(matches!(search.search(req).await, Err(CoreError::InvalidInput(_))));

        assert_eq!(provider.flight_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_outage_is_not_cached() {
        let (search, provider) = setup(true).await;
        provider.unavailable.store(true, Ordering::SeqCst);

        let err = search.search(request()).await.unwrap_err();
        assert!(matches!(err, CoreError::UpstreamUnavailable(_)));

        provider.unavailable.store(false, Ordering::SeqCst);
        assert!(!search.search(request()).await.unwrap().cached);
    }

    #[test]
    fn test_fingerprint_shape() {
        let (_, _, query) = normalize(request()).unwrap();
        assert_eq!(
            fingerprint(&query).as_str(),
            "flights:JFK:LHR:2025-03-01:oneway:1:ECONOMY:0:0:any:nomax:EUR"
        );
    }
}
