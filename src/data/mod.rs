pub mod datetime;
pub mod loader;
pub mod store;
pub mod unit_inference;
