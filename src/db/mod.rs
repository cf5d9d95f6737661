pub mod connection;
pub mod documents;
pub mod incidents;
pub mod neighborhoods;
pub mod readings;
pub mod stats;
pub mod users;

pub use connection::Database;
