pub mod incident;
pub mod resource;
pub mod stats;
