//! Visualization Module
//!
//! Renders the comparison charts to PNG files with plotters: one boxplot and
//! one time-series chart per metric (one box/line per country, mean marker
//! overlaid on the boxes), a pooled Pearson correlation heatmap across
//! metrics, and a radar chart of the normalized per-country metric table.
//! Every chart is a pure function of the cleaned dataset / ranking outputs
//! passed in.

use std::path::Path;

use chrono::NaiveDateTime;
use log::info;
use plotters::prelude::*;

use crate::data::{Dataset, Metric};
use crate::error::{Error, Result};
use crate::rank::RadarRow;
use crate::stats;

const CHART_SIZE: (u32, u32) = (900, 640);

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

// ===================== BOXPLOT =====================

/// Boxplot of one metric, one box per country, with the mean marked.
pub fn boxplot(dataset: &Dataset, metric: Metric, path: &Path) -> Result<()> {
    let countries = dataset.countries();
    let series: Vec<(String, Vec<f64>)> = countries
        .iter()
        .map(|c| (c.clone(), dataset.country_values(c, metric)))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    if series.is_empty() {
        return Err(Error::Plot(format!("no data to plot for {}", metric)));
    }

    let labels: Vec<String> = series.iter().map(|(c, _)| c.clone()).collect();
    let y_min = series
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .fold(f64::INFINITY, f64::min) as f32;
    let y_max = series
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max) as f32;
    let pad = ((y_max - y_min) * 0.08).max(1.0);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} by country (W/m²)", metric), ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(64)
        .build_cartesian_2d(labels[..].into_segmented(), (y_min - pad)..(y_max + pad))
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .y_desc(metric.column())
        .disable_x_mesh()
        .draw()
        .map_err(plot_err)?;

    for (label, values) in &series {
        let quartiles = Quartiles::new(values);
        chart
            .draw_series(std::iter::once(
                Boxplot::new_vertical(SegmentValue::CenterOf(label), &quartiles).width(40),
            ))
            .map_err(plot_err)?;

        // Mean marker on top of the box
        let mean = stats::mean(values) as f32;
        chart
            .draw_series(std::iter::once(Circle::new(
                (SegmentValue::CenterOf(label), mean),
                5,
                RED.filled(),
            )))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    info!("wrote boxplot {}", path.display());
    Ok(())
}

// ===================== TIME SERIES =====================

/// Time-series line chart of one metric, one line per country.
pub fn time_series(dataset: &Dataset, metric: Metric, path: &Path) -> Result<()> {
    let countries = dataset.countries();
    let series: Vec<(String, Vec<(NaiveDateTime, f64)>)> = countries
        .iter()
        .map(|country| {
            let points: Vec<(NaiveDateTime, f64)> = dataset
                .records
                .iter()
                .filter(|r| &r.country == country)
                .filter_map(|r| r.value(metric).map(|v| (r.timestamp, v)))
                .collect();
            (country.clone(), points)
        })
        .filter(|(_, p)| !p.is_empty())
        .collect();
    if series.is_empty() {
        return Err(Error::Plot(format!("no data to plot for {}", metric)));
    }

    let t_min = series.iter().flat_map(|(_, p)| p.iter().map(|(t, _)| *t)).min().unwrap();
    let t_max = series.iter().flat_map(|(_, p)| p.iter().map(|(t, _)| *t)).max().unwrap();
    let y_min = series
        .iter()
        .flat_map(|(_, p)| p.iter().map(|(_, v)| *v))
        .fold(f64::INFINITY, f64::min);
    let y_max = series
        .iter()
        .flat_map(|(_, p)| p.iter().map(|(_, v)| *v))
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((y_max - y_min) * 0.05).max(1.0);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} over time (W/m²)", metric), ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(64)
        .build_cartesian_2d(RangedDateTime::from(t_min..t_max), (y_min - pad)..(y_max + pad))
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .y_desc(metric.column())
        .x_labels(6)
        .draw()
        .map_err(plot_err)?;

    for (idx, (country, points)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(plot_err)?
            .label(country.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("wrote time series {}", path.display());
    Ok(())
}

// ===================== CORRELATION HEATMAP =====================

/// Pooled Pearson correlation matrix over the records where both metrics of
/// a pair are present. Entry (i, j) correlates `metrics[i]` with
/// `metrics[j]`; undefined correlations (constant series) are NaN.
pub fn correlation_matrix(dataset: &Dataset, metrics: &[Metric]) -> Vec<Vec<f64>> {
    let n = metrics.len();
    let mut matrix = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in 0..n {
            let mut x = Vec::new();
            let mut y = Vec::new();
            for r in &dataset.records {
                if let (Some(a), Some(b)) = (r.value(metrics[i]), r.value(metrics[j])) {
                    x.push(a);
                    y.push(b);
                }
            }
            // Diagonal is 1 by definition, but stays NaN below 2 samples,
            // matching the off-diagonal undefined policy
            matrix[i][j] = if i == j && x.len() >= 2 { 1.0 } else { stats::pearson(&x, &y) };
        }
    }
    matrix
}

/// Map a correlation in [-1, 1] to a blue-white-red gradient.
/// NaN renders as neutral grey.
pub fn heat_color(r: f64) -> RGBColor {
    if r.is_nan() {
        return RGBColor(200, 200, 200);
    }
    let r = r.clamp(-1.0, 1.0);
    if r >= 0.0 {
        // white → red
        let t = r;
        RGBColor(255, (255.0 * (1.0 - t)) as u8, (255.0 * (1.0 - t)) as u8)
    } else {
        // white → blue
        let t = -r;
        RGBColor((255.0 * (1.0 - t)) as u8, (255.0 * (1.0 - t)) as u8, 255)
    }
}

/// Render the pooled correlation heatmap with per-cell coefficients.
pub fn correlation_heatmap(dataset: &Dataset, metrics: &[Metric], path: &Path) -> Result<()> {
    let matrix = correlation_matrix(dataset, metrics);
    let n = metrics.len();

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Metric correlations (Pearson, pooled)", ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(64)
        .build_cartesian_2d(0f64..n as f64, 0f64..n as f64)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|v| label_for(metrics, *v))
        .y_label_formatter(&|v| label_for(metrics, *v))
        .draw()
        .map_err(plot_err)?;

    for (i, row) in matrix.iter().enumerate() {
        for (j, &r) in row.iter().enumerate() {
            let (x, y) = (j as f64, i as f64);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x, y), (x + 1.0, y + 1.0)],
                    heat_color(r).filled(),
                )))
                .map_err(plot_err)?;
            let text = if r.is_nan() { "—".to_string() } else { format!("{:.2}", r) };
            chart
                .draw_series(std::iter::once(Text::new(
                    text,
                    (x + 0.38, y + 0.45),
                    ("sans-serif", 18),
                )))
                .map_err(plot_err)?;
        }
    }

    root.present().map_err(plot_err)?;
    info!("wrote heatmap {}", path.display());
    Ok(())
}

fn label_for(metrics: &[Metric], v: f64) -> String {
    let idx = v.floor() as usize;
    metrics.get(idx).map(|m| m.column().to_string()).unwrap_or_default()
}

// ===================== RADAR CHART =====================

/// Radar chart of the normalized per-country metric table.
///
/// Axes are laid out clockwise from twelve o'clock, one per metric; each
/// country is one closed polygon. Input is exactly the Ranker's radar table.
pub fn radar_chart(radar: &[RadarRow], path: &Path) -> Result<()> {
    let axes = match radar.first() {
        Some(row) if !row.values.is_empty() => row.values.len(),
        _ => return Err(Error::Plot("radar chart needs at least one metric".to_string())),
    };

    let root = BitMapBackend::new(path, (720, 720)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Normalized solar metrics", ("sans-serif", 28))
        .margin(16)
        .build_cartesian_2d(-1.45f64..1.45, -1.35f64..1.35)
        .map_err(plot_err)?;

    // Polar position for axis `i` at radius `r`
    let point = |i: usize, r: f64| -> (f64, f64) {
        let angle = std::f64::consts::FRAC_PI_2 - (i as f64) * std::f64::consts::TAU / axes as f64;
        (r * angle.cos(), r * angle.sin())
    };

    // Spokes, unit ring and axis labels
    for (i, (metric, _)) in radar[0].values.iter().enumerate() {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, 0.0), point(i, 1.0)],
                RGBColor(180, 180, 180),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Text::new(
                metric.column().to_string(),
                point(i, 1.12),
                ("sans-serif", 20),
            )))
            .map_err(plot_err)?;
    }
    let ring: Vec<(f64, f64)> = (0..=axes).map(|i| point(i % axes, 1.0)).collect();
    chart
        .draw_series(std::iter::once(PathElement::new(ring, RGBColor(180, 180, 180))))
        .map_err(plot_err)?;

    for (idx, row) in radar.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let mut polygon: Vec<(f64, f64)> =
            row.values.iter().enumerate().map(|(i, (_, v))| point(i, *v)).collect();
        if let Some(first) = polygon.first().copied() {
            polygon.push(first);
        }
        chart
            .draw_series(std::iter::once(PathElement::new(
                polygon,
                color.stroke_width(3),
            )))
            .map_err(plot_err)?
            .label(row.country.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("wrote radar chart {}", path.display());
    Ok(())
}

// ===================== TESTS =====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use chrono::NaiveDate;

    fn record(ghi: f64, dni: f64) -> Record {
        Record {
            timestamp: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            country: "Benin".to_string(),
            ghi: Some(ghi),
            dni: Some(dni),
            dhi: None,
            tamb: None,
            rh: None,
            ws: None,
        }
    }

    #[test]
    fn test_correlation_matrix_diagonal_and_symmetry() {
        let ds = Dataset::new(vec![
            record(100.0, 50.0),
            record(200.0, 90.0),
            record(300.0, 160.0),
            record(400.0, 210.0),
        ]);
        let m = correlation_matrix(&ds, &[Metric::Ghi, Metric::Dni]);
        assert_eq!(m[0][0], 1.0);
        assert_eq!(m[1][1], 1.0);
        assert!((m[0][1] - m[1][0]).abs() < 1e-12);
        assert!(m[0][1] > 0.98);
    }

    #[test]
    fn test_correlation_with_all_missing_is_nan() {
        let ds = Dataset::new(vec![record(100.0, 50.0), record(200.0, 90.0)]);
        let m = correlation_matrix(&ds, &[Metric::Ghi, Metric::Dhi]);
        assert!(m[0][1].is_nan());
        assert!(m[1][1].is_nan());
    }

    #[test]
    fn test_time_series_without_data_is_an_error() {
        let ds = Dataset::new(vec![record(100.0, 50.0)]);
        // DHI is missing everywhere, so there is nothing to draw
        let result = time_series(&ds, Metric::Dhi, Path::new("unused.png"));
        assert!(matches!(result, Err(Error::Plot(_))));
    }

    #[test]
    fn test_single_record_diagonal_is_nan() {
        let ds = Dataset::new(vec![record(100.0, 50.0)]);
        let m = correlation_matrix(&ds, &[Metric::Ghi, Metric::Dni]);
        assert!(m[0][0].is_nan());
        assert!(m[1][1].is_nan());
        assert!(m[0][1].is_nan());
    }

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(heat_color(1.0), RGBColor(255, 0, 0));
        assert_eq!(heat_color(-1.0), RGBColor(0, 0, 255));
        assert_eq!(heat_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(heat_color(f64::NAN), RGBColor(200, 200, 200));
    }
}
