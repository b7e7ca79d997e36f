pub mod connection;
pub mod indexes;
pub mod model;
pub mod ops;

pub use connection::{create_sqlite_connection, create_sqlite_pool};
