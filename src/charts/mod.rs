//! Chart rendering.
//!
//! Charts are drawn with plotters' SVG backend and handed to the pages as
//! base64 `data:` URIs. The SVG backend writes text as `<text>` elements, so
//! no system fonts are needed at render time.

use crate::analysis::{histogram, sorted_tally, tag_tally, year_rating_trend};
use crate::config::ChartConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{HistogramBin, Record};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use tracing::debug;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const TREND_BLUE: RGBColor = RGBColor(31, 119, 180);

type DrawResult = Result<(), Box<dyn Error>>;

/// An encoded chart ready to embed in a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub mime: &'static str,
    /// Base64 encoded image bytes.
    pub data: String,
}

impl ChartImage {
    fn svg(document: &str) -> Self {
        Self {
            mime: "image/svg+xml",
            data: STANDARD.encode(document.as_bytes()),
        }
    }

    /// The image as a `data:` URI for an `<img src>` attribute.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// Pixel dimensions and binning shared by all charts.
#[derive(Debug, Clone, Copy)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    pub histogram_bins: usize,
}

impl From<&ChartConfig> for ChartSettings {
    fn from(config: &ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            histogram_bins: config.histogram_bins,
        }
    }
}

fn render_svg<F>(settings: ChartSettings, draw: F) -> DashboardResult<ChartImage>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    let mut document = String::new();
    {
        let root = SVGBackend::with_string(&mut document, (settings.width, settings.height))
            .into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| DashboardError::Render(e.to_string()))?;
        draw(&root).map_err(|e| DashboardError::Render(e.to_string()))?;
        root.present()
            .map_err(|e| DashboardError::Render(e.to_string()))?;
    }
    Ok(ChartImage::svg(&document))
}

/// Histogram of pre-computed bins.
pub fn histogram_chart(
    title: &str,
    x_desc: &str,
    bins: &[HistogramBin],
    color: RGBColor,
    settings: ChartSettings,
) -> DashboardResult<ChartImage> {
    let (x_min, x_max) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first.lower, last.upper),
        _ => (0.0, 1.0),
    };
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0) + 1;

    render_svg(settings, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, 0usize..y_max)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Movies")
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lower, 0), (b.upper, b.count)], color.mix(0.7).filled())
        }))?;
        chart.draw_series(
            bins.iter()
                .map(|b| Rectangle::new([(b.lower, 0), (b.upper, b.count)], BLACK.stroke_width(1))),
        )?;

        Ok(())
    })
}

/// Bar chart of labelled counts in the given order, with the count above
/// each bar.
pub fn bar_chart(
    title: &str,
    entries: &[(String, usize)],
    settings: ChartSettings,
) -> DashboardResult<ChartImage> {
    let n = entries.len().max(1) as u32;
    let y_max = entries.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let y_max = y_max + y_max / 10 + 1;
    let labels: Vec<&str> = entries.iter().map(|(label, _)| label.as_str()).collect();

    render_svg(settings, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(60)
            .y_label_area_size(50)
            .build_cartesian_2d((0u32..n).into_segmented(), 0usize..y_max)?;

        let label_for = |value: &SegmentValue<u32>| match value {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                labels.get(*i as usize).copied().unwrap_or_default().to_string()
            }
            SegmentValue::Last => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(entries.len().max(1))
            .x_label_formatter(&label_for)
            .x_label_style(("sans-serif", 11))
            .y_desc("Movies")
            .draw()?;

        chart.draw_series(entries.iter().enumerate().map(|(i, (_, count))| {
            let i = i as u32;
            let color = HSLColor(f64::from(i) / f64::from(n), 0.55, 0.6);
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), *count)],
                color.filled(),
            );
            bar.set_margin(0, 0, 4, 4);
            bar
        }))?;

        chart.draw_series(entries.iter().enumerate().map(|(i, (_, count))| {
            Text::new(
                count.to_string(),
                (SegmentValue::CenterOf(i as u32), *count),
                ("sans-serif", 12).into_font(),
            )
        }))?;

        Ok(())
    })
}

fn padded_range(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        (min - pad, max + pad)
    } else {
        (0.0, 1.0)
    }
}

/// Scatter plot colored along the y value.
pub fn scatter_chart(
    title: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
    settings: ChartSettings,
) -> DashboardResult<ChartImage> {
    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0), 5.0);
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1), 0.5);
    let span = (y_max - y_min).max(f64::EPSILON);

    render_svg(settings, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()?;

        chart.draw_series(points.iter().map(|&(x, y)| {
            // Low values purple, high values yellow-green
            let t = (y - y_min) / span;
            let color = HSLColor(0.75 - 0.55 * t, 0.7, 0.45);
            Circle::new((x, y), 4, color.mix(0.6).filled())
        }))?;

        Ok(())
    })
}

/// Line chart with point markers over integer x values.
pub fn trend_chart(
    title: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(i32, f64)],
    settings: ChartSettings,
) -> DashboardResult<ChartImage> {
    let x_min = points.iter().map(|p| p.0).min().unwrap_or(0);
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(0);
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1), 0.2);

    render_svg(settings, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((x_min - 1)..(x_max + 1), y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()?;

        chart.draw_series(LineSeries::new(
            points.iter().copied(),
            TREND_BLUE.stroke_width(2),
        ))?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, TREND_BLUE.filled())),
        )?;

        Ok(())
    })
}

/// Owned inputs for the five dashboard charts.
#[derive(Debug, Clone)]
pub struct ChartInputs {
    pub rating_bins: Vec<HistogramBin>,
    pub runtime_bins: Vec<HistogramBin>,
    pub genre_counts: Vec<(String, usize)>,
    pub runtime_vs_rating: Vec<(f64, f64)>,
    pub year_trend: Vec<(i32, f64)>,
}

impl ChartInputs {
    pub fn from_records(records: &[Record], bins: usize) -> Self {
        let ratings: Vec<f64> = records.iter().map(|r| r.rating).collect();
        let runtimes: Vec<f64> = records.iter().map(|r| r.runtime_minutes as f64).collect();

        Self {
            rating_bins: histogram(&ratings, bins),
            runtime_bins: histogram(&runtimes, bins),
            genre_counts: sorted_tally(&tag_tally(records)),
            runtime_vs_rating: runtimes.iter().copied().zip(ratings).collect(),
            year_trend: year_rating_trend(records).into_iter().collect(),
        }
    }
}

/// The five charts shown on the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardCharts {
    pub rating_distribution: ChartImage,
    pub runtime_distribution: ChartImage,
    pub genre_distribution: ChartImage,
    pub rating_runtime_scatter: ChartImage,
    pub year_rating_trend: ChartImage,
}

type ChartJob = Box<dyn FnOnce() -> DashboardResult<ChartImage> + Send>;

/// Render all dashboard charts concurrently on the blocking pool.
pub async fn render_dashboard(
    inputs: ChartInputs,
    settings: ChartSettings,
) -> DashboardResult<DashboardCharts> {
    let ChartInputs {
        rating_bins,
        runtime_bins,
        genre_counts,
        runtime_vs_rating,
        year_trend,
    } = inputs;

    let jobs: Vec<ChartJob> = vec![
        Box::new(move || {
            histogram_chart("Rating Distribution", "Rating", &rating_bins, SKY_BLUE, settings)
        }),
        Box::new(move || {
            histogram_chart(
                "Runtime Distribution",
                "Runtime (minutes)",
                &runtime_bins,
                LIGHT_GREEN,
                settings,
            )
        }),
        Box::new(move || bar_chart("Movies per Genre", &genre_counts, settings)),
        Box::new(move || {
            scatter_chart(
                "Rating vs Runtime",
                "Runtime (minutes)",
                "Rating",
                &runtime_vs_rating,
                settings,
            )
        }),
        Box::new(move || {
            trend_chart(
                "Average Rating by Year",
                "Year",
                "Average rating",
                &year_trend,
                settings,
            )
        }),
    ];

    let handles = jobs.into_iter().map(tokio::task::spawn_blocking);
    let results = futures::future::try_join_all(handles)
        .await
        .map_err(|e| DashboardError::Render(e.to_string()))?;

    let images = results
        .into_iter()
        .collect::<DashboardResult<Vec<ChartImage>>>()?;
    debug!("Rendered {} dashboard charts", images.len());

    let [rating_distribution, runtime_distribution, genre_distribution, rating_runtime_scatter, year_rating_trend]: [ChartImage; 5] =
        images
            .try_into()
            .map_err(|_| DashboardError::Render("unexpected chart count".to_string()))?;

    Ok(DashboardCharts {
        rating_distribution,
        runtime_distribution,
        genre_distribution,
        rating_runtime_scatter,
        year_rating_trend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::sample_dataset;

    fn settings() -> ChartSettings {
        ChartSettings::from(&ChartConfig::default())
    }

    fn decode(image: &ChartImage) -> String {
        String::from_utf8(STANDARD.decode(&image.data).unwrap()).unwrap()
    }

    #[test]
    fn test_histogram_chart_is_svg() {
        let bins = histogram(&[6.2, 7.0, 7.2, 7.3, 8.1], 4);
        let image =
            histogram_chart("Rating Distribution", "Rating", &bins, SKY_BLUE, settings()).unwrap();

        assert_eq!(image.mime, "image/svg+xml");
        assert!(image.data_uri().starts_with("data:image/svg+xml;base64,"));
        let svg = decode(&image);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Rating Distribution"));
    }

    #[test]
    fn test_bar_chart_labels_categories() {
        let entries = vec![("Adventure".to_string(), 7), ("Action".to_string(), 4)];
        let svg = decode(&bar_chart("Movies per Genre", &entries, settings()).unwrap());
        assert!(svg.contains("Adventure"));
        assert!(svg.contains("Action"));
    }

    #[test]
    fn test_charts_accept_empty_input() {
        assert!(histogram_chart("Empty", "x", &[], SKY_BLUE, settings()).is_ok());
        assert!(bar_chart("Empty", &[], settings()).is_ok());
        assert!(scatter_chart("Empty", "x", "y", &[], settings()).is_ok());
        assert!(trend_chart("Empty", "x", "y", &[], settings()).is_ok());
    }

    #[test]
    fn test_chart_inputs_from_records() {
        let records = sample_dataset().records;
        let inputs = ChartInputs::from_records(&records, 20);

        assert_eq!(inputs.rating_bins.len(), 20);
        assert_eq!(
            inputs.rating_bins.iter().map(|b| b.count).sum::<usize>(),
            records.len()
        );
        assert_eq!(inputs.genre_counts[0], ("Adventure".to_string(), 3));
        assert_eq!(inputs.runtime_vs_rating[0], (121.0, 8.1));
        assert_eq!(inputs.year_trend.first().map(|p| p.0), Some(2012));
    }

    #[tokio::test]
    async fn test_render_dashboard() {
        let records = sample_dataset().records;
        let charts = render_dashboard(ChartInputs::from_records(&records, 20), settings())
            .await
            .unwrap();

        assert!(decode(&charts.genre_distribution).contains("Movies per Genre"));
        assert!(decode(&charts.year_rating_trend).contains("Average Rating by Year"));
        assert_ne!(charts.rating_distribution, charts.runtime_distribution);
    }
}
