//! Inline SVG line charts.

use std::fmt::Write as _;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 280.0;
const PAD: f64 = 36.0;

/// One named line in a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<'a> {
    pub label: &'a str,
    pub color: &'a str,
    pub values: Vec<f64>,
}

impl<'a> Series<'a> {
    pub fn new(label: &'a str, color: &'a str, values: Vec<f64>) -> Self {
        Self {
            label,
            color,
            values,
        }
    }
}

/// Renders all series on a shared y axis. Series are expected to have equal length.
pub fn line_chart(title: &str, series: &[Series<'_>]) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="chart" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" aria-label="{title}" xmlns="http://www.w3.org/2000/svg">"#
    );
    let _ = write!(
        svg,
        r##"<rect x="{PAD}" y="{PAD}" width="{}" height="{}" fill="none" stroke="#d0d4dc"/>"##,
        WIDTH - 2.0 * PAD,
        HEIGHT - 2.0 * PAD
    );

    match value_range(series) {
        None => {
            let _ = write!(
                svg,
                r##"<text x="{}" y="{}" text-anchor="middle" fill="#8a909c">no data</text>"##,
                WIDTH / 2.0,
                HEIGHT / 2.0
            );
        }
        Some((min, max)) => {
            let _ = write!(
                svg,
                r##"<text x="4" y="{}" font-size="11" fill="#5b6270">{max:.2}</text><text x="4" y="{}" font-size="11" fill="#5b6270">{min:.2}</text>"##,
                PAD + 4.0,
                HEIGHT - PAD
            );
            for (index, line) in series.iter().enumerate() {
                let _ = write!(
                    svg,
                    r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                    line.color,
                    points(&line.values, min, max)
                );
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" font-size="12" fill="{}">{}</text>"#,
                    PAD + 8.0 + index as f64 * 110.0,
                    PAD - 10.0,
                    line.color,
                    line.label
                );
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

fn value_range(series: &[Series<'_>]) -> Option<(f64, f64)> {
    let mut values = series.iter().flat_map(|line| line.values.iter().copied());
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(min, max), v| (min.min(v), max.max(v)));

    if (max - min).abs() < f64::EPSILON {
        Some((min - 1.0, max + 1.0))
    } else {
        Some((min, max))
    }
}

fn points(values: &[f64], min: f64, max: f64) -> String {
    let plot_width = WIDTH - 2.0 * PAD;
    let plot_height = HEIGHT - 2.0 * PAD;
    let step = if values.len() > 1 {
        plot_width / (values.len() - 1) as f64
    } else {
        0.0
    };

    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let x = if values.len() > 1 {
                PAD + index as f64 * step
            } else {
                WIDTH / 2.0
            };
            let y = HEIGHT - PAD - (value - min) / (max - min) * plot_height;
            format!("{x:.1},{y:.1}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}
