//! Firedash - Wildfire Incident Dashboard Engine
//!
//! Loads a wildfire incident CSV, cleans and aggregates it, fetches
//! state boundaries over HTTP, and renders the four dashboard sections
//! (state bar chart, cause pie chart, marker map, choropleth) as static
//! images.

pub mod charts;
pub mod dashboard;
pub mod data;
pub mod geo;

pub use dashboard::{Dashboard, RenderSummary};
