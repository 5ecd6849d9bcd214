//! SVG rendering of ROC overlays and score histograms.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::{auc, RocCurve};

/// Presentation settings passed to every renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    /// Series colours as RGB triples, cycled in series order.
    pub palette: Vec<[u8; 3]>,
    pub line_width: u32,
    pub show_markers: bool,
    pub marker_size: u32,
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub caption_size: f64,
    pub label_size: f64,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            palette: vec![
                [0x1f, 0x77, 0xb4],
                [0xff, 0x7f, 0x0e],
                [0x2c, 0xa0, 0x2c],
                [0xd6, 0x27, 0x28],
                [0x94, 0x67, 0xbd],
                [0x8c, 0x56, 0x4b],
            ],
            line_width: 2,
            show_markers: true,
            marker_size: 3,
            width: 800,
            height: 600,
            font_family: "sans-serif".to_string(),
            caption_size: 22.0,
            label_size: 14.0,
        }
    }
}

impl PlotStyle {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn color(&self, idx: usize) -> RGBColor {
        if self.palette.is_empty() {
            return BLACK;
        }
        let [r, g, b] = self.palette[idx % self.palette.len()];
        RGBColor(r, g, b)
    }
}

/// How histogram bars are scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HistogramWeighting {
    /// Raw record counts.
    #[default]
    Count,
    /// Each group's bars sum to one.
    WithinGroup,
    /// Bars across all groups sum to 100.
    PercentOfTotal,
}

impl HistogramWeighting {
    fn axis_label(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::WithinGroup => "Proportion within group",
            Self::PercentOfTotal => "Percent of cohort",
        }
    }
}

/// Bar heights per group, indexed by score value from 0 to the largest value seen.
pub fn bin_weights(groups: &[(String, Vec<u32>)], weighting: HistogramWeighting) -> Vec<Vec<f64>> {
    let max_value = groups
        .iter()
        .flat_map(|(_, values)| values.iter().copied())
        .max()
        .unwrap_or(0) as usize;
    let total: usize = groups.iter().map(|(_, values)| values.len()).sum();

    groups
        .iter()
        .map(|(_, values)| {
            let mut counts = vec![0.0; max_value + 1];
            for &value in values {
                counts[value as usize] += 1.0;
            }
            let scale = match weighting {
                HistogramWeighting::Count => 1.0,
                HistogramWeighting::WithinGroup if values.is_empty() => 0.0,
                HistogramWeighting::WithinGroup => 1.0 / values.len() as f64,
                HistogramWeighting::PercentOfTotal => 100.0 / total.max(1) as f64,
            };
            counts.iter().map(|count| count * scale).collect()
        })
        .collect()
}

/// Overlay ROC curves on unit axes with the chance diagonal.
pub fn render_roc(path: &Path, title: &str, curves: &[(String, RocCurve)], style: &PlotStyle) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let font = style.font_family.as_str();
    let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, (font, style.caption_size))
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;
    chart
        .configure_mesh()
        .x_desc("False positive rate")
        .y_desc("True positive rate")
        .label_style((font, style.label_size))
        .draw()?;

    chart.draw_series(LineSeries::new(
        vec![(0.0, 0.0), (1.0, 1.0)],
        BLACK.mix(0.4).stroke_width(1),
    ))?;

    for (idx, (label, curve)) in curves.iter().enumerate() {
        let color = style.color(idx);
        let area = auc(curve);
        chart
            .draw_series(LineSeries::new(
                curve.coordinates(),
                color.stroke_width(style.line_width),
            ))?
            .label(format!("{label} (AUROC {area:.3})"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        if style.show_markers {
            chart.draw_series(
                curve
                    .coordinates()
                    .into_iter()
                    .map(|point| Circle::new(point, style.marker_size, color.filled())),
            )?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .label_font((font, style.label_size))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), curves = curves.len(), "ROC plot saved");
    Ok(())
}

/// Side-by-side bars of integer score values, one series per group.
pub fn render_histogram(
    path: &Path,
    title: &str,
    x_desc: &str,
    groups: &[(String, Vec<u32>)],
    weighting: HistogramWeighting,
    style: &PlotStyle,
) -> Result<()> {
    if groups.is_empty() {
        info!(%title, "no groups; skipping histogram");
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let weights = bin_weights(groups, weighting);
    let bins = weights.first().map_or(1, Vec::len);
    let peak = weights
        .iter()
        .flatten()
        .copied()
        .fold(0.0f64, f64::max);
    let y_max = if peak > 0.0 { peak * 1.1 } else { 1.0 };

    let font = style.font_family.as_str();
    let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, (font, style.caption_size))
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(bins as f64 - 0.5), 0f64..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(weighting.axis_label())
        .x_label_formatter(&|v| format!("{v:.0}"))
        .label_style((font, style.label_size))
        .draw()?;

    let bar_width = 0.8 / groups.len() as f64;
    for (idx, ((name, _), heights)) in groups.iter().zip(&weights).enumerate() {
        let color = style.color(idx);
        let offset = -0.4 + idx as f64 * bar_width;
        chart
            .draw_series(heights.iter().enumerate().map(|(value, &height)| {
                let x0 = value as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + bar_width, height)], color.mix(0.7).filled())
            }))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font((font, style.label_size))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), ?weighting, "histogram saved");
    Ok(())
}
