//! Dual-axis SVG chart: mentions on the left axis (bars plus a line), the
//! metric on the right axis. Missing metric values are drawn as zero.

use std::fmt::Write as _;
use std::path::Path;

use gamepulse_core::SeriesRow;

use super::{write_file, OutputError};

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 90.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: u32 = 5;
const MAX_X_LABELS: usize = 10;

const MENTIONS_BAR: &str = "#ffa500";
const MENTIONS_LINE: &str = "#ff8c00";
const METRIC_LINE: &str = "#4169e1";

pub(crate) struct ChartLabels<'a> {
    pub game_name: &'a str,
    pub metric_source: &'a str,
}

impl ChartLabels<'_> {
    fn title(&self) -> String {
        format!(
            "{}: Reddit mentions and Steam metric ({})",
            self.game_name, self.metric_source
        )
    }
}

/// Linear map from a value range onto the plot's vertical extent.
struct Scale {
    lo: f64,
    hi: f64,
}

impl Scale {
    fn new(values: impl Iterator<Item = f64>, floor_at_zero: bool) -> Self {
        let (mut lo, mut hi) = values.fold((f64::MAX, f64::MIN), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo > hi {
            (lo, hi) = (0.0, 1.0);
        }
        if floor_at_zero {
            lo = lo.min(0.0);
        }
        if (hi - lo).abs() < f64::EPSILON {
            lo -= 1.0;
            hi += 1.0;
        }
        Self { lo, hi }
    }

    fn y(&self, value: f64) -> f64 {
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + plot_h * (1.0 - (value - self.lo) / (self.hi - self.lo))
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        (0..=Y_TICKS).map(move |i| self.lo + (self.hi - self.lo) * f64::from(i) / f64::from(Y_TICKS))
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn render_chart(rows: &[SeriesRow], labels: &ChartLabels<'_>) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_bottom = HEIGHT - MARGIN_BOTTOM;
    let right_x = WIDTH - MARGIN_RIGHT;
    let slot = if rows.is_empty() {
        plot_w
    } else {
        plot_w / rows.len() as f64
    };
    let x_at = |i: usize| MARGIN_LEFT + slot * (i as f64 + 0.5);

    let mentions = Scale::new(rows.iter().map(|r| r.mentions as f64), true);
    let metric = Scale::new(
        rows.iter().map(|r| r.metric.unwrap_or(0) as f64),
        false,
    );

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="11">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="25" text-anchor="middle" font-size="15">{}</text>"#,
        WIDTH / 2.0,
        escape(&labels.title())
    );

    // Axes frame.
    let _ = writeln!(
        svg,
        r##"<path d="M{MARGIN_LEFT},{MARGIN_TOP} V{plot_bottom} H{right_x} V{MARGIN_TOP}" fill="none" stroke="#333"/>"##
    );

    for tick in mentions.ticks() {
        let y = mentions.y(tick);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{y:.1}" text-anchor="end" dominant-baseline="middle" fill="{MENTIONS_LINE}">{tick:.0}</text>"#,
            MARGIN_LEFT - 6.0
        );
    }
    for tick in metric.ticks() {
        let y = metric.y(tick);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{y:.1}" dominant-baseline="middle" fill="{METRIC_LINE}">{tick:.0}</text>"#,
            right_x + 6.0
        );
    }
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{}" transform="rotate(-90 18 {})" text-anchor="middle" fill="{MENTIONS_LINE}">Reddit mentions</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="{}" transform="rotate(90 {x} {})" text-anchor="middle" fill="{METRIC_LINE}">Steam metric</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0,
        x = WIDTH - 12.0
    );

    let label_every = rows.len().div_ceil(MAX_X_LABELS).max(1);
    for (i, row) in rows.iter().enumerate() {
        let x = x_at(i);
        let bar_top = mentions.y(row.mentions as f64);
        let _ = writeln!(
            svg,
            r#"<rect x="{:.1}" y="{bar_top:.1}" width="{:.1}" height="{:.1}" fill="{MENTIONS_BAR}" fill-opacity="0.4"/>"#,
            x - slot * 0.35,
            slot * 0.7,
            (plot_bottom - bar_top).max(0.0)
        );
        if i % label_every == 0 {
            let _ = writeln!(
                svg,
                r#"<text x="{x:.1}" y="{}" text-anchor="middle">{}</text>"#,
                plot_bottom + 16.0,
                row.date.format("%m-%d")
            );
        }
    }

    let mention_points: Vec<(f64, f64)> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (x_at(i), mentions.y(r.mentions as f64)))
        .collect();
    let metric_points: Vec<(f64, f64)> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (x_at(i), metric.y(r.metric.unwrap_or(0) as f64)))
        .collect();
    push_polyline(&mut svg, &mention_points, MENTIONS_LINE);
    push_polyline(&mut svg, &metric_points, METRIC_LINE);
    for (x, y) in &metric_points {
        let _ = writeln!(
            svg,
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{METRIC_LINE}"/>"#
        );
    }

    // Legend.
    let legend = [
        (MENTIONS_LINE, "Reddit mentions (line)"),
        (MENTIONS_BAR, "Reddit mentions (bar)"),
        (METRIC_LINE, "Steam metric"),
    ];
    for (i, (color, text)) in legend.iter().enumerate() {
        let y = MARGIN_TOP + 12.0 + 16.0 * i as f64;
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="12" height="8" fill="{color}"/><text x="{}" y="{y}">{text}</text>"#,
            MARGIN_LEFT + 10.0,
            y - 8.0,
            MARGIN_LEFT + 28.0
        );
    }

    svg.push_str("</svg>\n");
    svg
}

pub(crate) fn write_chart(
    path: &Path,
    rows: &[SeriesRow],
    labels: &ChartLabels<'_>,
) -> Result<(), OutputError> {
    write_file(path, &render_chart(rows, labels))?;
    tracing::info!(path = %path.display(), "wrote chart");
    Ok(())
}

fn push_polyline(svg: &mut String, points: &[(f64, f64)], color: &str) {
    if points.is_empty() {
        return;
    }
    let coords: Vec<String> = points.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
    let _ = writeln!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="2"/>"#,
        coords.join(" ")
    );
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
