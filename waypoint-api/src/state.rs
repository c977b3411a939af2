use std::sync::Arc;
use waypoint_core::provider::TravelProvider;
use waypoint_core::repository::{LocationStore, ResultCache};
use waypoint_search::{CacheAside, CacheTtls, FlightSearch, HotelSearch, LocationResolver};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<LocationResolver>,
    pub flights: Arc<FlightSearch>,
    pub hotels: Arc<HotelSearch>,
    pub environment: String,
}

impl AppState {
    /// Wires the search services over one store, one cache and one provider.
    pub fn new(
        store: Arc<dyn LocationStore>,
        cache: Arc<dyn ResultCache>,
        provider: Arc<dyn TravelProvider>,
        ttls: CacheTtls,
        max_location_age: Option<chrono::Duration>,
        environment: impl Into<String>,
    ) -> Self {
        let cache = CacheAside::new(cache);

        let resolver = Arc::new(
            LocationResolver::new(store, provider.clone(), cache.clone(), ttls.location_search)
                .with_max_age(max_location_age),
        );
        let flights = Arc::new(FlightSearch::new(
            provider.clone(),
            resolver.clone(),
            cache.clone(),
            ttls.flight_search,
        ));
        let hotels = Arc::new(HotelSearch::new(provider, resolver.clone(), cache, ttls.hotel_search));

        Self {
            resolver,
            flights,
            hotels,
            environment: environment.into(),
        }
    }
}
