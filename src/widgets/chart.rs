//! Chart panel: renders a committed chart projection as a bar chart, line
//! chart, or proportion legend (the terminal stand-in for a pie chart).

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Line,
    widgets::{
        Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget,
    },
};

use crate::api::ChartProjection;
use crate::view_state::ChartType;

/// Colors cycled through pie legend rows.
const PIE_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Blue,
    Color::Red,
];

pub struct ChartView<'a> {
    pub projection: &'a ChartProjection,
    pub chart_type: ChartType,
}

/// Truncate a label to `max` characters with a trailing ellipsis.
fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let kept: String = label.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Percentage shares of the absolute values, one per point.
fn shares(points: &[(String, f64)]) -> Vec<f64> {
    let total: f64 = points.iter().map(|(_, v)| v.abs()).sum();
    if total == 0.0 {
        return vec![0.0; points.len()];
    }
    points.iter().map(|(_, v)| v.abs() / total * 100.0).collect()
}

impl ChartView<'_> {
    fn title(&self) -> String {
        format!(
            "{}: {} by {}",
            self.chart_type.as_str(),
            self.projection.y_column,
            self.projection.x_column
        )
    }

    fn render_bar(&self, points: &[(String, f64)], area: Rect, buf: &mut Buffer) {
        let labeled: Vec<(String, u64)> = points
            .iter()
            .map(|(label, v)| (truncate_label(label, 8), v.max(0.0).round() as u64))
            .collect();
        let data: Vec<(&str, u64)> = labeled.iter().map(|(l, v)| (l.as_str(), *v)).collect();
        BarChart::default()
            .block(Block::default().borders(Borders::ALL).title(self.title()))
            .bar_width(9)
            .bar_gap(1)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .data(&data)
            .render(area, buf);
    }

    fn render_line(&self, points: &[(String, f64)], area: Rect, buf: &mut Buffer) {
        let series: Vec<(f64, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, (_, v))| (i as f64, *v))
            .collect();
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (_, v) in &series {
            y_min = y_min.min(*v);
            y_max = y_max.max(*v);
        }
        if !y_min.is_finite() || y_min == y_max {
            y_min -= 1.0;
            y_max += 1.0;
        }
        let x_max = (series.len().saturating_sub(1)).max(1) as f64;

        let datasets = vec![Dataset::default()
            .name(self.projection.y_column.clone())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&series)];

        // First/last x labels only; grouped categories have no numeric axis.
        let x_labels = vec![
            Line::from(truncate_label(
                points.first().map(|(l, _)| l.as_str()).unwrap_or(""),
                12,
            )),
            Line::from(truncate_label(
                points.last().map(|(l, _)| l.as_str()).unwrap_or(""),
                12,
            )),
        ];
        let y_labels = vec![
            Line::from(format!("{:.1}", y_min)),
            Line::from(format!("{:.1}", (y_min + y_max) / 2.0)),
            Line::from(format!("{:.1}", y_max)),
        ];

        Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL).title(self.title()))
            .x_axis(Axis::default().bounds([0.0, x_max]).labels(x_labels))
            .y_axis(Axis::default().bounds([y_min, y_max]).labels(y_labels))
            .render(area, buf);
    }

    fn render_pie(&self, points: &[(String, f64)], area: Rect, buf: &mut Buffer) {
        let mut ranked: Vec<(usize, &(String, f64))> = points.iter().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1 .1
                .abs()
                .partial_cmp(&a.1 .1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let pct = shares(points);

        let inner_width = area.width.saturating_sub(2) as usize;
        let bar_width = inner_width.saturating_sub(28).max(4);
        let lines: Vec<Line> = ranked
            .iter()
            .enumerate()
            .map(|(rank, (i, (label, value)))| {
                let filled = (pct[*i] / 100.0 * bar_width as f64).round() as usize;
                let bar: String = "█".repeat(filled.min(bar_width));
                Line::styled(
                    format!(
                        "{:<12} {:>10.2} {:>5.1}% {}",
                        truncate_label(label, 12),
                        value,
                        pct[*i],
                        bar
                    ),
                    Style::default().fg(PIE_COLORS[rank % PIE_COLORS.len()]),
                )
            })
            .collect();

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(self.title()))
            .render(area, buf);
    }
}

impl Widget for &ChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let points = self.projection.points();
        if points.is_empty() {
            Paragraph::new("No chart data")
                .block(Block::default().borders(Borders::ALL).title(self.title()))
                .render(area, buf);
            return;
        }
        match self.chart_type {
            ChartType::Bar => self.render_bar(&points, area, buf),
            ChartType::Line => self.render_line(&points, area, buf),
            ChartType::Pie => self.render_pie(&points, area, buf),
        }
    }
}
