// src/infrastructure/store/mod.rs
mod memory;
mod redis_store;

pub use memory::InMemoryKvStore;
pub use redis_store::RedisKvStore;
