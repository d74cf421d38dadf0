//! Data module - CSV loading, cleaning and aggregation

mod loader;
mod pipeline;

pub use loader::{DataLoader, FireRecord, ParseError, REQUIRED_COLUMNS};
pub use pipeline::{
    count_by, drop_missing_coordinates, sample, CategoryCount, GeoSample, GroupField,
    MissingDataError,
};
