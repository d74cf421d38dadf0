//! Charts module - static section rendering

mod maps;
mod plotter;

pub use maps::MapRenderer;
pub use plotter::{ChartPlotter, BAR_COLOR, PALETTE, PIE_HOLE};
