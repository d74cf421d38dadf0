//! Dashboard Module
//! One render pass per uploaded file: load, clean, aggregate, fetch
//! boundaries and write the section images. Section failures stay
//! confined to their own section; only a parse failure halts the pass.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::charts::{ChartPlotter, MapRenderer};
use crate::data::{
    self, CategoryCount, DataLoader, FireRecord, GeoSample, GroupField, MissingDataError,
    ParseError,
};
use crate::geo::{BoundaryCollection, BoundaryStore, FetchError};

/// Marker-map sample cap.
pub const GEO_SAMPLE_CAP: usize = 3000;
/// Fixed sampling seed so re-uploading the same file plots the same points.
pub const GEO_SAMPLE_SEED: u64 = 42;
/// US state boundaries backing the choropleth.
pub const US_STATES_URL: &str = "https://raw.githubusercontent.com/\
                                 python-visualization/folium-example-data/main/us_states.json";
/// Output size of every section image.
pub const SECTION_SIZE: (u32, u32) = (1000, 600);

/// Outcome of one full render pass. Sections that could not be produced
/// carry a user-facing reason instead of aborting the rest.
#[derive(Debug, Default)]
pub struct RenderSummary {
    /// Section image paths written, in render order.
    pub rendered: Vec<String>,
    /// `(section, reason)` for every section that was skipped.
    pub skipped: Vec<(String, String)>,
}

impl RenderSummary {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    fn section(&mut self, name: &str, outcome: anyhow::Result<String>) {
        match outcome {
            Ok(path) => self.rendered.push(path),
            Err(err) => {
                log::error!("{name} section failed: {err}");
                self.skipped.push((name.to_string(), err.to_string()));
            }
        }
    }

    fn skip(&mut self, name: &str, reason: impl ToString) {
        self.skipped.push((name.to_string(), reason.to_string()));
    }
}

/// A single dashboard render pass over one uploaded file. All derived
/// data is recomputed from scratch here; only the caller's
/// [`BoundaryStore`] outlives the pass.
pub struct Dashboard {
    records: Vec<FireRecord>,
    loaded: usize,
}

impl Dashboard {
    /// Load and clean an uploaded CSV. A parse failure halts the pass
    /// before any section is computed.
    pub fn from_reader<R: Read>(input: R) -> Result<Self, ParseError> {
        let records = DataLoader::load(input)?;
        let loaded = records.len();
        let records = data::drop_missing_coordinates(&records);
        log::info!(
            "{} of {loaded} records have usable coordinates",
            records.len()
        );
        Ok(Self { records, loaded })
    }

    /// Rows in the upload, before cleaning.
    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    /// Rows surviving the coordinate filter; the count shown on the page.
    pub fn cleaned_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[FireRecord] {
        &self.records
    }

    /// Fires per state. Feeds both the bar chart and the choropleth fill.
    pub fn state_counts(&self) -> CategoryCount {
        data::count_by(&self.records, GroupField::State)
    }

    /// Fires per cause, the pie chart input.
    pub fn cause_counts(&self) -> CategoryCount {
        data::count_by(&self.records, GroupField::Cause)
    }

    /// Bounded seeded sample for the marker map.
    pub fn geo_sample(&self) -> Result<GeoSample, MissingDataError> {
        if self.records.is_empty() {
            return Err(MissingDataError { total: self.loaded });
        }
        Ok(data::sample(&self.records, GEO_SAMPLE_CAP, GEO_SAMPLE_SEED))
    }

    /// Boundary collection for the choropleth, via the caller-owned store.
    pub fn boundaries(
        &self,
        store: &mut BoundaryStore,
        url: &str,
    ) -> Result<Arc<BoundaryCollection>, FetchError> {
        store.get(url)
    }

    /// Render every available section into `out_dir`.
    ///
    /// A boundary [`FetchError`] skips only the choropleth; a
    /// [`MissingDataError`] skips only the two map sections. The bar and
    /// pie charts always render (blank when the upload is empty).
    pub fn render_all(
        &self,
        store: &mut BoundaryStore,
        boundary_url: &str,
        out_dir: &Path,
    ) -> RenderSummary {
        let mut summary = RenderSummary::default();

        let state_counts = self.state_counts();
        let cause_counts = self.cause_counts();

        summary.section("bar chart", {
            let path = out_dir.join("fires_by_state.png");
            ChartPlotter::render_bar_chart(
                &state_counts,
                "Wildfires per state",
                &path,
                SECTION_SIZE,
            )
            .map(|()| path.display().to_string())
        });

        summary.section("pie chart", {
            let path = out_dir.join("fire_causes.png");
            ChartPlotter::render_pie_chart(&cause_counts, "Fire causes", &path, SECTION_SIZE)
                .map(|()| path.display().to_string())
        });

        let boundaries = match self.boundaries(store, boundary_url) {
            Ok(collection) => Some(collection),
            Err(err) => {
                log::warn!("choropleth unavailable: {err}");
                summary.skip("choropleth", &err);
                None
            }
        };

        match self.geo_sample() {
            Ok(geo_sample) => {
                summary.section("marker map", {
                    let path = out_dir.join("fire_locations.png");
                    MapRenderer::render_marker_map(
                        &geo_sample,
                        boundaries.as_deref(),
                        "Fire locations (sampled)",
                        &path,
                        SECTION_SIZE,
                    )
                    .map(|()| path.display().to_string())
                });

                if let Some(collection) = &boundaries {
                    summary.section("choropleth", {
                        let path = out_dir.join("fires_choropleth.png");
                        MapRenderer::render_choropleth(
                            &state_counts,
                            collection,
                            "Wildfires per state (choropleth)",
                            &path,
                            SECTION_SIZE,
                        )
                        .map(|()| path.display().to_string())
                    });
                }
            }
            Err(err) => {
                log::warn!("map sections unavailable: {err}");
                summary.skip("marker map", &err);
                if boundaries.is_some() {
                    summary.skip("choropleth", &err);
                }
            }
        }

        summary
    }
}
