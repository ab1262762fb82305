pub mod coerce;
pub mod config;
pub mod error;
pub mod linkage;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod reports;
pub mod sink;
pub mod table;
