pub mod cache_aside;
pub mod flights;
pub mod hotels;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use cache_aside::{CacheAside, Cached, Fingerprint};
pub use flights::FlightSearch;
pub use hotels::HotelSearch;
pub use resolver::LocationResolver;

/// Result cache lifetimes, in seconds, per search kind.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub location_search: u64,
    pub flight_search: u64,
    pub hotel_search: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            location_search: 86_400,
            flight_search: 900,
            hotel_search: 3_600,
        }
    }
}
