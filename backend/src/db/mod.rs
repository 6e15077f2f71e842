pub mod connection;
pub mod connections;
pub mod messages;
pub mod migrations;
pub mod profiles;
pub mod tables;

pub use connection::{get_db_pool, get_in_memory_pool, DatabaseConfig};
