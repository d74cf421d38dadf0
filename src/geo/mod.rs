//! Geo module - boundary fetching and caching

mod boundaries;

pub use boundaries::{
    BoundaryCollection, BoundaryRegion, BoundaryStore, BoundaryTransport, FetchError,
    HttpTransport, FETCH_TIMEOUT,
};
