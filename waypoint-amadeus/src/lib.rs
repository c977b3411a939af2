//! Amadeus Self-Service implementation of [`TravelProvider`].

mod auth;
mod error;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use waypoint_core::provider::{
    FlightOfferQuery, FlightOffersPage, HotelOfferQuery, ProviderFlightOffer, ProviderHotelOffers,
    ProviderLocation, TravelProvider,
};
use waypoint_core::{CoreResult, LocationCode, LocationKind};

pub use auth::TokenCache;
pub use error::AmadeusError;

const TEST_BASE_URL: &str = "https://test.api.amadeus.com";
const PRODUCTION_BASE_URL: &str = "https://api.amadeus.com";

const LOCATIONS_PAGE_LIMIT: u32 = 20;
/// "No rooms available at requested property"
const NO_ROOMS_ERROR_CODE: u32 = 3664;

#[derive(Debug, Clone)]
pub struct AmadeusSettings {
    pub client_id: String,
    pub client_secret: String,
    pub hostname: String,
    pub timeout: Duration,
}

pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenCache,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    meta: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelListing {
    hotel_id: String,
}

/// Maps the configured hostname to an API base URL.
pub fn base_url_for(hostname: &str) -> String {
    match hostname.trim() {
        "test" | "" => TEST_BASE_URL.to_string(),
        "production" => PRODUCTION_BASE_URL.to_string(),
        url => url.trim_end_matches('/').to_string(),
    }
}

impl AmadeusClient {
    pub fn new(settings: AmadeusSettings) -> Result<Self, AmadeusError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        let base_url = base_url_for(&settings.hostname);

        Ok(Self {
            tokens: TokenCache::new(
                format!("{}/v1/security/oauth2/token", base_url),
                settings.client_id,
                settings.client_secret,
            ),
            http,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET with bearer auth. A 401 drops the token and the call is retried
    /// once with a fresh one.
    async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<Envelope<T>, AmadeusError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut retried = false;

        loop {
            let token = self.tokens.bearer(&self.http).await?;
            let response = self
                .http
                .get(&url)
                .bearer_auth(&token)
                .query(query)
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate(&token).await;
                if !retried {
                    warn!(path, "Access token rejected, retrying with a fresh one");
                    retried = true;
                    continue;
                }
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AmadeusError::from_response(status.as_u16(), &body));
            }

            return Ok(response.json::<Envelope<T>>().await?);
        }
    }
}

#[async_trait]
impl TravelProvider for AmadeusClient {
    #[instrument(skip(self), level = "debug")]
    async fn find_locations(
        &self,
        keyword: &str,
        kinds: &[LocationKind],
    ) -> CoreResult<Vec<ProviderLocation>> {
        let sub_type = kinds
            .iter()
            .map(|k| k.as_provider_str())
            .collect::<Vec<_>>()
            .join(",");
        let page_limit = LOCATIONS_PAGE_LIMIT.to_string();

        let envelope: Envelope<Vec<ProviderLocation>> = self
            .get(
                "/v1/reference-data/locations",
                &[
                    ("keyword", keyword),
                    ("subType", sub_type.as_str()),
                    ("sort", "analytics.travelers.score"),
                    ("page[limit]", page_limit.as_str()),
                ],
            )
            .await?;

        Ok(envelope.data.unwrap_or_default())
    }

    #[instrument(skip(self, query), fields(origin = %query.origin_location_code, destination = %query.destination_location_code))]
    async fn search_flight_offers(&self, query: &FlightOfferQuery) -> CoreResult<FlightOffersPage> {
        let envelope: Envelope<Vec<ProviderFlightOffer>> =
            self.get("/v2/shopping/flight-offers", query).await?;
        let page = FlightOffersPage {
            data: envelope.data.unwrap_or_default(),
            meta: envelope.meta,
        };
        debug!(offers = page.data.len(), "Flight offers received");
        Ok(page)
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_hotels_by_city(&self, city_code: &LocationCode) -> CoreResult<Vec<String>> {
        let envelope: Envelope<Vec<HotelListing>> = self
            .get(
                "/v1/reference-data/locations/hotels/by-city",
                &[("cityCode", city_code.as_str())],
            )
            .await?;

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.hotel_id)
            .collect())
    }

    #[instrument(skip(self, hotel_ids, query), fields(hotels = hotel_ids.len()))]
    async fn search_hotel_offers(
        &self,
        hotel_ids: &[String],
        query: &HotelOfferQuery,
    ) -> CoreResult<Vec<ProviderHotelOffers>> {
        if hotel_ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("hotelIds", hotel_ids.join(",")),
            ("checkInDate", query.check_in_date.clone()),
            ("checkOutDate", query.check_out_date.clone()),
            ("adults", query.adults.to_string()),
            ("roomQuantity", query.room_quantity.to_string()),
            ("currency", query.currency.clone()),
            ("paymentPolicy", "NONE".to_string()),
            ("boardType", "ROOM_ONLY".to_string()),
        ];

        match self.get::<Vec<ProviderHotelOffers>, _>("/v3/shopping/hotel-offers", &params).await {
            Ok(envelope) => Ok(envelope.data.unwrap_or_default()),
            Err(e) if e.has_code(NO_ROOMS_ERROR_CODE) => {
                debug!("No rooms available for requested hotels");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stand-in for the Amadeus API: numbered tokens, and a locations
    /// endpoint that refuses `rejected` bearer tokens.
    #[derive(Default)]
    struct FakeAmadeus {
        tokens_issued: AtomicUsize,
        location_hits: AtomicUsize,
        rejected: Vec<String>,
    }

    async fn issue_token(State(fake): State<Arc<FakeAmadeus>>) -> Json<Value> {
        let n = fake.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({ "access_token": format!("t{}", n), "expires_in": 1799 }))
    }

    async fn locations(
        State(fake): State<Arc<FakeAmadeus>>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        fake.location_hits.fetch_add(1, Ordering::SeqCst);
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();

        if fake.rejected.iter().any(|t| t == bearer) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "errors": [{ "status": 401, "code": 38190, "title": "Invalid access token" }] })),
            );
        }
        (
            StatusCode::OK,
            Json(json!({ "data": [{ "subType": "AIRPORT", "name": "HEATHROW", "iataCode": "LHR" }] })),
        )
    }

    async fn serve(fake: Arc<FakeAmadeus>) -> AmadeusClient {
        let app = Router::new()
            .route("/v1/security/oauth2/token", post(issue_token))
            .route("/v1/reference-data/locations", get(locations))
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        AmadeusClient::new(AmadeusSettings {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            hostname: format!("http://{}", addr),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_revoked_token_refreshed_and_call_retried() {
        let fake = Arc::new(FakeAmadeus {
            rejected: vec!["t1".to_string()],
            ..Default::default()
        });
        let client = serve(fake.clone()).await;

        let found = client.find_locations("LHR", &[LocationKind::Airport]).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(fake.tokens_issued.load(Ordering::SeqCst), 2);
        assert_eq!(fake.location_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_rejection_is_an_error() {
        let fake = Arc::new(FakeAmadeus {
            rejected: vec!["t1".to_string(), "t2".to_string()],
            ..Default::default()
        });
        let client = serve(fake.clone()).await;

        let err = client.find_locations("LHR", &[LocationKind::Airport]).await.unwrap_err();

        assert!(matches!(err, waypoint_core::CoreError::UpstreamUnavailable(_)));
        assert_eq!(fake.location_hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_base_url_resolution() {
        assert_eq!(base_url_for("test"), TEST_BASE_URL);
        assert_eq!(base_url_for("production"), PRODUCTION_BASE_URL);
        assert_eq!(base_url_for("http://localhost:8080/"), "http://localhost:8080");
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<Vec<ProviderLocation>> =
            serde_json::from_str(r#"{ "meta": { "count": 0 } }"#).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.meta.is_some());
    }

    #[test]
    fn test_hotel_listing_ids() {
        let envelope: Envelope<Vec<HotelListing>> = serde_json::from_str(
            r#"{ "data": [ { "hotelId": "HLPAR266", "name": "X" }, { "hotelId": "ADPAR001" } ] }"#,
        )
        .unwrap();
        let ids: Vec<_> = envelope.data.unwrap().into_iter().map(|h| h.hotel_id).collect();
        assert_eq!(ids, vec!["HLPAR266", "ADPAR001"]);
    }
}
