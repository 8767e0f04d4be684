use crate::models::ChartSeries;
use std::fmt::Write;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 260.0;
const PAD_X: f64 = 44.0;
const PAD_Y: f64 = 34.0;
const TOP: f64 = 24.0;

const PALETTE: [&str; 8] = [
    "#ff6b4a", "#2f4858", "#f2a541", "#5b8c5a", "#7e6b8f", "#3a7ca5", "#c05761", "#8b857d",
];

/// Pure renderers: the same series always produces the same SVG, and a
/// re-render replaces the whole element. No incremental path exists.
pub fn line_chart(series: &ChartSeries, label: &str) -> String {
    let mut svg = open_svg(label);
    if series.data.is_empty() {
        svg.push_str(EMPTY_NOTE);
        svg.push_str("</svg>");
        return svg;
    }

    let mut min = series.data.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut max = series.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    min = min.min(0.0);
    max = max.max(0.0);
    if min == max {
        min -= 1.0;
        max += 1.0;
    }

    let range = max - min;
    let count = series.data.len();
    let x_step = if count > 1 {
        (WIDTH - PAD_X * 2.0) / (count as f64 - 1.0)
    } else {
        0.0
    };
    let scale_y = (HEIGHT - TOP - PAD_Y) / range;
    let x = |index: usize| PAD_X + index as f64 * x_step;
    let y = |value: f64| HEIGHT - PAD_Y - (value - min) * scale_y;

    // horizontal grid with value labels
    const TICKS: usize = 4;
    for i in 0..=TICKS {
        let value = min + range * i as f64 / TICKS as f64;
        let y_pos = y(value);
        let _ = write!(
            svg,
            "<line class=\"chart-grid\" x1=\"{PAD_X}\" y1=\"{y_pos:.2}\" x2=\"{:.2}\" y2=\"{y_pos:.2}\" />",
            WIDTH - PAD_X
        );
        let _ = write!(
            svg,
            "<text class=\"chart-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
            PAD_X - 10.0,
            y_pos + 4.0,
            fmt_axis(value)
        );
    }

    let _ = write!(
        svg,
        "<line class=\"chart-axis\" x1=\"{PAD_X}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" />",
        y(0.0),
        WIDTH - PAD_X,
        y(0.0)
    );

    let mut path = String::new();
    for (index, value) in series.data.iter().enumerate() {
        let _ = write!(
            path,
            "{} {:.2} {:.2} ",
            if index == 0 { "M" } else { "L" },
            x(index),
            y(*value)
        );
    }
    let _ = write!(svg, "<path class=\"chart-line\" d=\"{}\" />", path.trim_end());

    for (index, value) in series.data.iter().enumerate() {
        let _ = write!(
            svg,
            "<circle class=\"chart-point\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"4\" />",
            x(index),
            y(*value)
        );
    }

    let label_every = if count > 8 { 2 } else { 1 };
    for (index, text) in series.labels.iter().enumerate() {
        if index % label_every != 0 || index >= count {
            continue;
        }
        let _ = write!(
            svg,
            "<text class=\"chart-label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
            x(index),
            HEIGHT - PAD_Y + 18.0,
            escape(text)
        );
    }

    svg.push_str("</svg>");
    svg
}

pub fn pie_chart(series: &ChartSeries, label: &str) -> String {
    let mut svg = open_svg(label);
    let total: f64 = series.data.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        svg.push_str(EMPTY_NOTE);
        svg.push_str("</svg>");
        return svg;
    }

    let cx = 130.0;
    let cy = 130.0;
    let r = 96.0;
    let mut acc = 0.0;
    let mut legend_row = 0usize;

    for (index, value) in series.data.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }
        let color = PALETTE[index % PALETTE.len()];
        let fraction = value / total;
        if fraction >= 0.999 {
            let _ = write!(
                svg,
                "<circle class=\"chart-slice\" cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\" fill=\"{color}\" />"
            );
        } else {
            let (x0, y0) = arc_point(cx, cy, r, acc);
            let (x1, y1) = arc_point(cx, cy, r, acc + fraction);
            let large = if fraction > 0.5 { 1 } else { 0 };
            let _ = write!(
                svg,
                "<path class=\"chart-slice\" d=\"M {cx} {cy} L {x0:.2} {y0:.2} A {r} {r} 0 {large} 1 {x1:.2} {y1:.2} Z\" fill=\"{color}\" />"
            );
        }
        acc += fraction;

        let ly = 48.0 + legend_row as f64 * 26.0;
        let _ = write!(
            svg,
            "<rect x=\"268\" y=\"{:.2}\" width=\"12\" height=\"12\" fill=\"{color}\" rx=\"3\" />",
            ly - 10.0
        );
        let name = series.labels.get(index).map(String::as_str).unwrap_or("?");
        let _ = write!(
            svg,
            "<text class=\"chart-label\" x=\"288\" y=\"{ly:.2}\">{} - {}</text>",
            escape(name),
            fmt_axis(*value)
        );
        legend_row += 1;
    }

    svg.push_str("</svg>");
    svg
}

fn open_svg(label: &str) -> String {
    format!(
        "<svg class=\"chart\" viewBox=\"0 0 {WIDTH:.0} {HEIGHT:.0}\" role=\"img\" aria-label=\"{}\">",
        escape(label)
    )
}

const EMPTY_NOTE: &str =
    "<text class=\"chart-label\" x=\"50%\" y=\"50%\" text-anchor=\"middle\">No data yet</text>";

fn arc_point(cx: f64, cy: f64, r: f64, fraction: f64) -> (f64, f64) {
    let angle = fraction * std::f64::consts::TAU - std::f64::consts::FRAC_PI_2;
    (cx + r * angle.cos(), cy + r * angle.sin())
}

fn fmt_axis(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded:.1}")
    }
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> ChartSeries {
        ChartSeries {
            labels: values.iter().map(|v| format!("d{v}")).collect(),
            data: values.to_vec(),
        }
    }

    #[test]
    fn line_chart_is_idempotent() {
        let s = series(&[1.0, 4.0, 2.0, 8.0]);
        assert_eq!(line_chart(&s, "progress"), line_chart(&s, "progress"));
    }

    #[test]
    fn line_chart_draws_one_point_per_value() {
        let s = series(&[1.0, 4.0, 2.0]);
        let svg = line_chart(&s, "progress");
        assert_eq!(svg.matches("chart-point").count(), 3);
        assert_eq!(svg.matches("<path class=\"chart-line\"").count(), 1);
    }

    #[test]
    fn empty_series_renders_placeholder() {
        let empty = ChartSeries::default();
        assert!(line_chart(&empty, "progress").contains("No data yet"));
        assert!(pie_chart(&empty, "skills").contains("No data yet"));
    }

    #[test]
    fn pie_chart_skips_zero_slices() {
        let s = ChartSeries {
            labels: vec!["a".into(), "b".into(), "c".into()],
            data: vec![3.0, 0.0, 1.0],
        };
        let svg = pie_chart(&s, "distribution");
        assert_eq!(svg.matches("chart-slice").count(), 2);
        assert!(svg.contains("a - 3"));
        assert!(!svg.contains("b - 0"));
    }

    #[test]
    fn pie_chart_single_slice_is_a_full_circle() {
        let s = ChartSeries {
            labels: vec!["only".into()],
            data: vec![5.0],
        };
        let svg = pie_chart(&s, "distribution");
        assert!(svg.contains("<circle class=\"chart-slice\""));
    }

    #[test]
    fn labels_are_escaped() {
        let s = ChartSeries {
            labels: vec!["<b>".into()],
            data: vec![1.0],
        };
        let svg = line_chart(&s, "progress");
        assert!(svg.contains("&lt;b&gt;"));
        assert!(!svg.contains("<b>"));
    }
}
