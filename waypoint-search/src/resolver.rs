use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use waypoint_core::provider::TravelProvider;
use waypoint_core::repository::LocationStore;
use waypoint_core::search::RouteMap;
use waypoint_core::{
    CoreError, CoreResult, Location, LocationCandidate, LocationCode, LocationKind, MapPoint,
};

use crate::cache_aside::{CacheAside, Cached, Fingerprint};

pub const MIN_KEYWORD_LEN: usize = 2;

const RESOLVABLE_KINDS: [LocationKind; 2] = [LocationKind::Airport, LocationKind::City];

/// Turns codes and keywords into coordinates: the location store first, the
/// travel provider on a miss, writing whatever the provider teaches us back
/// into the store.
pub struct LocationResolver {
    store: Arc<dyn LocationStore>,
    provider: Arc<dyn TravelProvider>,
    cache: CacheAside,
    search_ttl_seconds: u64,
    max_age: Option<chrono::Duration>,
}

impl LocationResolver {
    pub fn new(
        store: Arc<dyn LocationStore>,
        provider: Arc<dyn TravelProvider>,
        cache: CacheAside,
        search_ttl_seconds: u64,
    ) -> Self {
        Self {
            store,
            provider,
            cache,
            search_ttl_seconds,
            max_age: None,
        }
    }

    /// Stored rows older than `max_age` are re-resolved through the provider.
    pub fn with_max_age(mut self, max_age: Option<chrono::Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub async fn resolve(&self, raw_code: &str) -> CoreResult<Location> {
        let code = LocationCode::parse(raw_code)?;
        self.resolve_code(&code).await
    }

    pub async fn resolve_code(&self, code: &LocationCode) -> CoreResult<Location> {
        let stale = match self.store.get(code).await {
            Ok(Some(location)) if !self.is_stale(&location) => {
                debug!(%code, "Location store hit");
                return Ok(location);
            }
            Ok(Some(location)) => {
                info!(%code, updated_at = %location.updated_at, "Stored location is stale, re-resolving");
                Some(location)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(%code, error = %e, "Location store read failed, treating as miss");
                None
            }
        };

        match self.resolve_upstream(code).await {
            Ok(location) => Ok(location),
            Err(e) => match stale {
                Some(location) => {
                    warn!(%code, error = %e, "Re-resolution failed, serving stored location");
                    Ok(location)
                }
                None => Err(e),
            },
        }
    }

    async fn resolve_upstream(&self, code: &LocationCode) -> CoreResult<Location> {
        let candidate = self
            .provider
            .find_location_by_code(code)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no location matches {}", code)))?;

        let coordinate = candidate
            .coordinate()
            .ok_or_else(|| CoreError::NotFound(format!("no coordinates for {}", code)))?;

        let address = candidate.address.clone().unwrap_or_default();
        let location = Location {
            code: code.clone(),
            name: candidate.name.clone(),
            city: address.city_name,
            country: address.country_name,
            country_code: address.country_code,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            kind: candidate.kind().unwrap_or(LocationKind::Airport),
            updated_at: Utc::now(),
        };

        self.persist(&location).await;
        info!(%code, "Location resolved from provider");
        Ok(location)
    }

    /// Best-effort write: the resolved location is valid whether or not it
    /// made it into the store.
    async fn persist(&self, location: &Location) {
        if let Err(e) = self.store.upsert(location).await {
            warn!(code = %location.code, error = %e, "Location store write failed");
        }
    }

    fn is_stale(&self, location: &Location) -> bool {
        match self.max_age {
            Some(max_age) => Utc::now() - location.updated_at > max_age,
            None => false,
        }
    }

    /// Free-text airport/city search ranked by provider relevance. Every
    /// result carrying coordinates is written to the location store.
    pub async fn search(&self, keyword: &str) -> CoreResult<Cached<Vec<LocationCandidate>>> {
        let keyword = keyword.trim();
        if keyword.chars().count() < MIN_KEYWORD_LEN {
            return Err(CoreError::InvalidInput(format!(
                "Keyword must be at least {} characters",
                MIN_KEYWORD_LEN
            )));
        }

        let key = Fingerprint::new("locations").part(keyword.to_lowercase());

        self.cache
            .get_or_fetch(&key, self.search_ttl_seconds, || async {
                let found = self.provider.find_locations(keyword, &RESOLVABLE_KINDS).await?;

                let mut candidates: Vec<LocationCandidate> =
                    found.iter().map(|l| l.to_candidate()).collect();
                candidates.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

                let now = Utc::now();
                let learned: Vec<Location> =
                    candidates.iter().filter_map(|c| c.to_location(now)).collect();
                join_all(learned.iter().map(|l| self.persist(l))).await;
                debug!(keyword, results = candidates.len(), stored = learned.len(), "Location search");

                Ok(candidates)
            })
            .await
    }

    pub async fn coordinates(&self, raw_code: &str) -> CoreResult<MapPoint> {
        Ok(self.resolve(raw_code).await?.map_point())
    }

    /// Resolution for map enrichment: any failure yields `None`.
    pub async fn map_point(&self, code: &LocationCode) -> Option<MapPoint> {
        match self.resolve_code(code).await {
            Ok(location) => Some(location.map_point()),
            Err(e) => {
                warn!(%code, error = %e, "Map enrichment skipped");
                None
            }
        }
    }

    /// Distance and viewport between two codes, resolved concurrently.
    pub async fn route_map(&self, origin: &str, destination: &str) -> CoreResult<RouteMap> {
        let origin = LocationCode::parse(origin)?;
        let destination = LocationCode::parse(destination)?;

        let (from, to) = tokio::join!(self.resolve_code(&origin), self.resolve_code(&destination));

        Ok(RouteMap::between(from?.map_point(), to?.map_point()))
    }
}
