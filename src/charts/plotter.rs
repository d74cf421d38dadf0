//! Chart Plotter Module
//! Static bar and pie charts for the dashboard summary sections.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use crate::data::CategoryCount;

/// Bar fill, matching the dashboard's primary series color.
pub const BAR_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

/// Donut hole fraction of the pie radius.
pub const PIE_HOLE: f64 = 0.4;

/// Renders the summary chart sections as static images.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Render the per-category bar chart to a PNG file.
    pub fn render_bar_chart(
        counts: &CategoryCount,
        title: &str,
        path: &Path,
        size: (u32, u32),
    ) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        Self::draw_bar_chart(&root, counts, title)?;
        root.present()?;
        Ok(())
    }

    /// Draw the bar chart onto any backend; tests use an in-memory buffer.
    pub fn draw_bar_chart<DB>(
        root: &DrawingArea<DB, Shift>,
        counts: &CategoryCount,
        title: &str,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let ranked = counts.ranked();
        if ranked.is_empty() {
            // Empty upload: a blank section, not a crash.
            return Ok(());
        }

        let n = ranked.len();
        let max = counts.max();
        let y_max = max + max / 5 + 1;

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(52)
            .build_cartesian_2d((0usize..n).into_segmented(), 0u64..y_max)?;

        let labels = ranked.clone();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&move |segment: &SegmentValue<usize>| match segment {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels
                    .get(*i)
                    .map(|(label, _)| label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_desc("Number of fires")
            .draw()?;

        chart.draw_series(ranked.iter().enumerate().map(|(i, (_, count))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0),
                    (SegmentValue::Exact(i + 1), *count),
                ],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 2, 2);
            bar
        }))?;

        Ok(())
    }

    /// Render the category-share donut chart to a PNG file.
    pub fn render_pie_chart(
        counts: &CategoryCount,
        title: &str,
        path: &Path,
        size: (u32, u32),
    ) -> Result<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        Self::draw_pie_chart(&root, counts, title)?;
        root.present()?;
        Ok(())
    }

    /// Draw the donut chart onto any backend.
    pub fn draw_pie_chart<DB>(
        root: &DrawingArea<DB, Shift>,
        counts: &CategoryCount,
        title: &str,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let ranked = counts.ranked();
        if ranked.is_empty() {
            return Ok(());
        }

        let root = root.titled(title, ("sans-serif", 22))?;
        let (width, height) = root.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);
        let radius = f64::from(width.min(height)) * 0.36;

        let sizes: Vec<f64> = ranked.iter().map(|(_, count)| *count as f64).collect();
        let colors: Vec<RGBColor> = (0..ranked.len())
            .map(|i| PALETTE[i % PALETTE.len()])
            .collect();
        let labels: Vec<String> = ranked.iter().map(|(label, _)| label.clone()).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 12).into_font().color(&BLACK));
        root.draw(&pie)?;

        // Donut hole over the pie center.
        root.draw(&Circle::new(
            center,
            (radius * PIE_HOLE) as i32,
            WHITE.filled(),
        ))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{count_by, FireRecord, GroupField};

    fn counts() -> CategoryCount {
        let records: Vec<FireRecord> = [
            ("CA", "Lightning"),
            ("CA", "Arson"),
            ("CA", "Lightning"),
            ("OR", "Campfire"),
            ("TX", "Lightning"),
        ]
        .iter()
        .map(|(state, cause)| FireRecord {
            state: state.to_string(),
            cause: cause.to_string(),
            fire_size: Some(1.0),
            latitude: Some(35.0),
            longitude: Some(-100.0),
        })
        .collect();
        count_by(&records, GroupField::State)
    }

    fn buffer_has_ink(buf: &[u8]) -> bool {
        buf.chunks(3).any(|px| px != [255, 255, 255])
    }

    #[test]
    fn bar_chart_draws_into_buffer() {
        let mut buf = vec![0u8; 400 * 300 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (400, 300)).into_drawing_area();
            ChartPlotter::draw_bar_chart(&root, &counts(), "Fires per state").unwrap();
            root.present().unwrap();
        }
        assert!(buffer_has_ink(&buf));
    }

    #[test]
    fn pie_chart_draws_into_buffer() {
        let mut buf = vec![0u8; 400 * 300 * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (400, 300)).into_drawing_area();
            ChartPlotter::draw_pie_chart(&root, &counts(), "Fire causes").unwrap();
            root.present().unwrap();
        }
        assert!(buffer_has_ink(&buf));
    }

    #[test]
    fn empty_counts_render_blank_sections() {
        let empty = CategoryCount::default();
        let mut buf = vec![0u8; 200 * 150 * 3];
        let root = BitMapBackend::with_buffer(&mut buf, (200, 150)).into_drawing_area();
        ChartPlotter::draw_bar_chart(&root, &empty, "Fires per state").unwrap();
        ChartPlotter::draw_pie_chart(&root, &empty, "Fire causes").unwrap();
    }
}
