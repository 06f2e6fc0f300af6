mod memory;
mod postgres;

pub use memory::InMemoryUserDirectory;
pub use postgres::PostgresUserDirectory;
