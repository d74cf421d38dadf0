//! Map Renderer Module
//! Marker and choropleth sections as static images. Coordinates are
//! plotted on a plain lon/lat plane; tile projection belongs to the
//! interactive map widget, not this crate.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use crate::data::{CategoryCount, GeoSample};
use crate::geo::BoundaryCollection;

/// YlOrRd endpoints for the choropleth fill.
const RAMP_LOW: RGBColor = RGBColor(255, 255, 178);
const RAMP_HIGH: RGBColor = RGBColor(189, 0, 38);
/// Incident marker color.
const MARKER: RGBColor = RGBColor(227, 26, 28);
/// Region outline color.
const OUTLINE: RGBColor = RGBColor(110, 110, 110);

/// Renders the two map sections of the dashboard.
pub struct MapRenderer;

impl MapRenderer {
    /// Render the sampled incident markers to a PNG file. Boundary
    /// outlines are drawn underneath when available.
    pub fn render_marker_map(
        sample: &GeoSample,
        boundaries: Option<&BoundaryCollection>,
        title: &str,
        path: &Path,
        size: (u32, u32),
    ) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        Self::draw_marker_map(&root, sample, boundaries, title)?;
        root.present()?;
        Ok(())
    }

    /// Draw the marker map onto any backend.
    pub fn draw_marker_map<DB>(
        root: &DrawingArea<DB, Shift>,
        sample: &GeoSample,
        boundaries: Option<&BoundaryCollection>,
        title: &str,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        if sample.is_empty() {
            return Ok(());
        }

        let points: Vec<(f64, f64)> = sample
            .records()
            .iter()
            .filter_map(|r| Some((r.longitude?, r.latitude?)))
            .collect();
        let (lon_range, lat_range) = padded_ranges(&points);

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(32)
            .y_label_area_size(44)
            .build_cartesian_2d(lon_range, lat_range)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("Longitude")
            .y_desc("Latitude")
            .draw()?;

        if let Some(collection) = boundaries {
            for region in collection.regions() {
                for ring in &region.polygons {
                    chart.draw_series(std::iter::once(PathElement::new(
                        ring.clone(),
                        OUTLINE.stroke_width(1),
                    )))?;
                }
            }
        }

        chart.draw_series(
            points
                .iter()
                .map(|&(lon, lat)| Circle::new((lon, lat), 2, MARKER.filled())),
        )?;

        Ok(())
    }

    /// Render the per-region choropleth to a PNG file.
    pub fn render_choropleth(
        counts: &CategoryCount,
        boundaries: &BoundaryCollection,
        title: &str,
        path: &Path,
        size: (u32, u32),
    ) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        Self::draw_choropleth(&root, counts, boundaries, title)?;
        root.present()?;
        Ok(())
    }

    /// Draw the choropleth onto any backend. Fill values come from the
    /// same tally that feeds the bar chart; regions absent from the
    /// tally fill at zero.
    pub fn draw_choropleth<DB>(
        root: &DrawingArea<DB, Shift>,
        counts: &CategoryCount,
        boundaries: &BoundaryCollection,
        title: &str,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let Some((min_lon, min_lat, max_lon, max_lat)) = boundaries.bounds() else {
            return Ok(());
        };

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(32)
            .y_label_area_size(44)
            .build_cartesian_2d(min_lon..max_lon, min_lat..max_lat)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("Longitude")
            .y_desc("Latitude")
            .draw()?;

        let max = counts.max();
        for region in boundaries.regions() {
            let share = if max == 0 {
                0.0
            } else {
                counts.get(&region.id) as f64 / max as f64
            };
            let fill = ramp(share);
            for ring in &region.polygons {
                chart.draw_series(std::iter::once(Polygon::new(ring.clone(), fill.filled())))?;
                chart.draw_series(std::iter::once(PathElement::new(
                    ring.clone(),
                    OUTLINE.stroke_width(1),
                )))?;
            }
        }

        Ok(())
    }
}

/// Linear interpolation between the ramp endpoints.
fn ramp(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let channel = |low: u8, high: u8| -> u8 {
        (f64::from(low) + (f64::from(high) - f64::from(low)) * t).round() as u8
    };
    RGBColor(
        channel(RAMP_LOW.0, RAMP_HIGH.0),
        channel(RAMP_LOW.1, RAMP_HIGH.1),
        channel(RAMP_LOW.2, RAMP_HIGH.2),
    )
}

/// Bounding ranges padded so markers never sit on the frame edge.
fn padded_ranges(points: &[(f64, f64)]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    for &(lon, lat) in points {
        min_lon = min_lon.min(lon);
        max_lon = max_lon.max(lon);
        min_lat = min_lat.min(lat);
        max_lat = max_lat.max(lat);
    }
    let lon_pad = ((max_lon - min_lon) * 0.05).max(0.5);
    let lat_pad = ((max_lat - min_lat) * 0.05).max(0.5);
    (
        (min_lon - lon_pad)..(max_lon + lon_pad),
        (min_lat - lat_pad)..(max_lat + lat_pad),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{count_by, sample, FireRecord, GroupField};

    fn records() -> Vec<FireRecord> {
        vec![
            FireRecord {
                state: "CA".to_string(),
                cause: "Lightning".to_string(),
                fire_size: Some(10.0),
                latitude: Some(36.5),
                longitude: Some(-119.0),
            },
            FireRecord {
                state: "CA".to_string(),
                cause: "Arson".to_string(),
                fire_size: Some(2.0),
                latitude: Some(38.0),
                longitude: Some(-121.0),
            },
            FireRecord {
                state: "NV".to_string(),
                cause: "Campfire".to_string(),
                fire_size: Some(1.0),
                latitude: Some(39.5),
                longitude: Some(-116.5),
            },
        ]
    }

    fn square(id: &str, lon: f64, lat: f64) -> String {
        format!(
            r#"{{"type": "Feature", "id": "{id}", "properties": {{"name": "{id}"}},
                "geometry": {{"type": "Polygon", "coordinates":
                [[[{a}, {c}], [{b}, {c}], [{b}, {d}], [{a}, {d}], [{a}, {c}]]]}}}}"#,
            a = lon,
            b = lon + 5.0,
            c = lat,
            d = lat + 5.0,
        )
    }

    fn boundaries() -> BoundaryCollection {
        let payload = format!(
            r#"{{"type": "FeatureCollection", "features": [{}, {}]}}"#,
            square("CA", -124.0, 34.0),
            square("NV", -119.0, 36.0),
        );
        BoundaryCollection::parse(&payload).unwrap()
    }

    #[test]
    fn marker_map_draws_sampled_points() {
        let sample = sample(&records(), 3000, 42);
        let mut buf = vec![0u8; 400 * 300 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (400, 300)).into_drawing_area();
            MapRenderer::draw_marker_map(&root, &sample, Some(&boundaries()), "Fire locations")
                .unwrap();
            root.present().unwrap();
        }
        assert!(buf.chunks(3).any(|px| px == [MARKER.0, MARKER.1, MARKER.2]));
    }

    #[test]
    fn choropleth_fills_hotter_regions_darker() {
        let counts = count_by(&records(), GroupField::State);
        let mut buf = vec![0u8; 400 * 300 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (400, 300)).into_drawing_area();
            MapRenderer::draw_choropleth(&root, &counts, &boundaries(), "Fires per state")
                .unwrap();
            root.present().unwrap();
        }
        let hot = ramp(1.0);
        assert!(buf.chunks(3).any(|px| px == [hot.0, hot.1, hot.2]));
    }

    #[test]
    fn empty_sample_renders_blank_marker_map() {
        let sample = sample(&[], 3000, 42);
        let mut buf = vec![0u8; 200 * 150 * 3];
        let root = BitMapBackend::with_buffer(&mut buf, (200, 150)).into_drawing_area();
        MapRenderer::draw_marker_map(&root, &sample, None, "Fire locations").unwrap();
    }

    #[test]
    fn ramp_endpoints_match_palette() {
        assert_eq!(ramp(0.0).0, RAMP_LOW.0);
        assert_eq!(ramp(1.0).2, RAMP_HIGH.2);
    }
}
