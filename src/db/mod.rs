pub mod cache;
pub mod postgres;
pub mod redis;

pub use cache::{CacheKey, CacheTier, CacheWriterHandle, PrecomputedRow, RecommendationCache, WriteReceipt};
pub use postgres::create_pool;
pub use redis::create_redis_client;
