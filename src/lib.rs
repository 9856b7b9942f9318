//! Linked multi-panel explorer for environmental time series.
//!
//! Datasets are ingested once into a [`data::store::SeriesStore`], a
//! [`state::session::Session`] tracks which are shown, in what order and
//! over which time range, and [`render`] turns that state into either the
//! interactive egui panels or a static PNG.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod render;
pub mod state;
pub mod ui;
