pub mod app_config;
pub mod database;
pub mod location_repo;
pub mod memory;
pub mod redis_repo;

pub use database::DbClient;
pub use location_repo::PostgresLocationStore;
pub use memory::{MemoryLocationStore, MemoryResultCache};
pub use redis_repo::RedisClient;
