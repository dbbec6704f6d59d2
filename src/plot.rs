//! Plotting of daily series.
//!
//! Only built with the `plotting` feature. Charts are drawn with ratatui into
//! an off-screen buffer and returned as text.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    symbols::Marker,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Widget},
};

/// Render `values` as a line chart of `width` x `height` cells.
pub fn render_series(title: &str, values: &[f64], width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);

    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64, v))
        .collect();

    let (y_min, y_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
            (lo.min(v), hi.max(v))
        });
    let (y_min, y_max) = if points.is_empty() {
        (0.0, 1.0)
    } else if y_min == y_max {
        (y_min - 1.0, y_max + 1.0)
    } else {
        (y_min, y_max)
    };
    let x_max = values.len().saturating_sub(1).max(1) as f64;

    let datasets = vec![Dataset::default()
        .name(title)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .data(&points)];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec!["0".to_string(), format!("{}", x_max)]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![format_axis_label(y_min), format_axis_label(y_max)]),
        );
    chart.render(area, &mut buffer);

    let mut text = String::with_capacity((width as usize + 1) * height as usize);
    for y in 0..height {
        for x in 0..width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

/// Format axis label with smart precision.
fn format_axis_label(val: f64) -> String {
    let abs_val = val.abs();
    if abs_val == 0.0 {
        "0".to_string()
    } else if !(1e-2..1e5).contains(&abs_val) {
        format!("{:.1e}", val)
    } else if abs_val >= 100.0 {
        format!("{:.0}", val)
    } else {
        format!("{:.1}", val)
    }
}
