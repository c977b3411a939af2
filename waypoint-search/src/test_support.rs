use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use waypoint_core::provider::{
    Analytics, FlightOfferQuery, FlightOffersPage, GeoCode, HotelOfferQuery, ProviderAddress,
    ProviderHotelOffers, ProviderLocation, TravelProvider, TravelerAnalytics,
};
use waypoint_core::repository::{LocationStore, ResultCache};
use waypoint_core::{CoreError, CoreResult, Location, LocationCode, LocationKind};
use waypoint_store::MemoryLocationStore;

pub struct FailingCache;

#[async_trait]
impl ResultCache for FailingCache {
    async fn get(&self, _key: &str) -> CoreResult<Option<Vec<u8>>> {
        Err(CoreError::StoreUnavailable("cache down".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl_seconds: u64) -> CoreResult<()> {
        Err(CoreError::StoreUnavailable("cache down".to_string()))
    }
}

/// Location store that counts calls and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryLocationStore,
    pub gets: AtomicUsize,
    pub upserts: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl RecordingStore {
    pub async fn seed(&self, location: Location) {
        self.inner.upsert(&location).await.unwrap();
    }

    pub async fn row(&self, code: &str) -> Option<Location> {
        self.inner.get(&LocationCode::parse(code).unwrap()).await.unwrap()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationStore for RecordingStore {
    async fn get(&self, code: &LocationCode) -> CoreResult<Option<Location>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CoreError::StoreUnavailable("db down".to_string()));
        }
        self.inner.get(code).await
    }

    async fn upsert(&self, location: &Location) -> CoreResult<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::StoreUnavailable("db down".to_string()));
        }
        self.inner.upsert(location).await
    }
}

/// Scripted provider. Locations are matched by keyword prefix on code, name
/// or city, mimicking the provider's keyword search.
#[derive(Default)]
pub struct FakeProvider {
    pub locations: Vec<ProviderLocation>,
    pub flight_page: FlightOffersPage,
    pub hotel_ids: Vec<String>,
    pub hotel_offers: Vec<ProviderHotelOffers>,
    pub unavailable: AtomicBool,
    pub location_calls: AtomicUsize,
    pub flight_calls: AtomicUsize,
    pub hotel_list_calls: AtomicUsize,
    pub requested_hotel_ids: Mutex<Vec<String>>,
    pub flight_queries: Mutex<Vec<FlightOfferQuery>>,
}

impl FakeProvider {
    fn check_up(&self) -> CoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::UpstreamUnavailable("provider down".to_string()));
        }
        Ok(())
    }

    pub fn location_calls(&self) -> usize {
        self.location_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TravelProvider for FakeProvider {
    async fn find_locations(
        &self,
        keyword: &str,
        kinds: &[LocationKind],
    ) -> CoreResult<Vec<ProviderLocation>> {
        self.location_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        let keyword = keyword.to_ascii_uppercase();

        Ok(self
            .locations
            .iter()
            .filter(|l| l.kind().map(|k| kinds.contains(&k)).unwrap_or(false))
            .filter(|l| {
                let city = l.address.as_ref().and_then(|a| a.city_name.clone()).unwrap_or_default();
                l.iata_code.as_deref().unwrap_or_default().starts_with(&keyword)
                    || l.name.to_ascii_uppercase().starts_with(&keyword)
                    || city.to_ascii_uppercase().starts_with(&keyword)
            })
            .cloned()
            .collect())
    }

    async fn search_flight_offers(&self, query: &FlightOfferQuery) -> CoreResult<FlightOffersPage> {
        self.flight_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        self.flight_queries.lock().unwrap().push(query.clone());
        Ok(self.flight_page.clone())
    }

    async fn list_hotels_by_city(&self, _city_code: &LocationCode) -> CoreResult<Vec<String>> {
        self.hotel_list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        Ok(self.hotel_ids.clone())
    }

    async fn search_hotel_offers(
        &self,
        hotel_ids: &[String],
        _query: &HotelOfferQuery,
    ) -> CoreResult<Vec<ProviderHotelOffers>> {
        self.check_up()?;
        self.requested_hotel_ids.lock().unwrap().extend(hotel_ids.iter().cloned());
        Ok(self
            .hotel_offers
            .iter()
            .filter(|h| hotel_ids.contains(&h.hotel.hotel_id))
            .cloned()
            .collect())
    }
}

pub fn provider_location(
    code: &str,
    name: &str,
    city: &str,
    sub_type: &str,
    coords: Option<(f64, f64)>,
    score: f64,
) -> ProviderLocation {
    ProviderLocation {
        iata_code: Some(code.to_string()),
        name: name.to_string(),
        sub_type: Some(sub_type.to_string()),
        address: Some(ProviderAddress {
            city_name: Some(city.to_string()),
            country_name: Some("TESTLAND".to_string()),
            country_code: Some("TL".to_string()),
        }),
        geo_code: coords.map(|(lat, lon)| GeoCode {
            latitude: Some(lat),
            longitude: Some(lon),
        }),
        analytics: Some(Analytics {
            travelers: Some(TravelerAnalytics { score: Some(score) }),
        }),
    }
}

pub fn stored_location(code: &str, lat: f64, lon: f64) -> Location {
    Location {
        code: LocationCode::parse(code).unwrap(),
        name: format!("{} STORED", code),
        city: Some("STORED CITY".to_string()),
        country: Some("TESTLAND".to_string()),
        country_code: Some("TL".to_string()),
        latitude: lat,
        longitude: lon,
        kind: LocationKind::Airport,
        updated_at: chrono::Utc::now(),
    }
}
