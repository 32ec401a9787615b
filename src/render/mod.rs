//! Thin presentation layer over `App`'s read model. No state lives here;
//! everything is derived from the controller on each draw.

mod layout;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, StatefulWidget, Table, Widget},
};
use serde_json::Value;

use crate::api::TablePage;
use crate::view_state::SortSpec;
use crate::widgets::chart::ChartView;
use crate::widgets::controls::Controls;
use crate::{App, Focus, PromptKind, TableStatus};

/// Cell text for a JSON value; null renders empty like the web dashboard.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Column widths sized to header and visible cells, clamped to [6, 24].
fn column_widths(page: &TablePage) -> Vec<Constraint> {
    page.columns
        .iter()
        .map(|col| {
            let mut w = col.chars().count();
            for row in &page.rows {
                w = w.max(cell_text(row.get(col)).chars().count());
            }
            Constraint::Length(w.clamp(6, 24) as u16 + 1)
        })
        .collect()
}

fn header_cell<'a>(col: &str, sort: Option<&SortSpec>, selected: bool) -> Cell<'a> {
    let mut text = col.to_string();
    if let Some(s) = sort {
        if s.column == col {
            text = format!("{} {}", text, s.direction.indicator());
        }
    }
    let mut style = Style::default().add_modifier(Modifier::BOLD);
    if selected {
        style = style.bg(Color::Cyan).fg(Color::Black);
    }
    Cell::from(text).style(style)
}

fn render_datasets(app: &App, area: Rect, buf: &mut Buffer) {
    let focused = app.focus == Focus::Datasets;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let items: Vec<ListItem> = app
        .datasets()
        .iter()
        .map(|d| {
            let date = d.created_at.format("%Y-%m-%d %H:%M");
            let selected = app.view().dataset_id.as_deref() == Some(d.id.as_str());
            let marker = if selected { "● " } else { "  " };
            ListItem::new(format!("{}{}\n  {}", marker, d.display_name, date))
        })
        .collect();
    let empty = items.is_empty();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title("Datasets"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if !empty {
        state.select(Some(app.dataset_cursor));
    }
    StatefulWidget::render(list, area, buf, &mut state);

    if empty {
        let hint = if app.datasets.is_loading() {
            "Loading...".to_string()
        } else if let Some(e) = app.datasets.error() {
            format!("Error: {}", e)
        } else {
            "No datasets. Press u to upload.".to_string()
        };
        Paragraph::new(hint).render(
            Rect::new(area.x + 2, area.y + 2, area.width.saturating_sub(4), 1),
            buf,
        );
    }
}

fn render_table(app: &App, area: Rect, buf: &mut Buffer) {
    let focused = app.focus == Focus::Table;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title = match app.table_status() {
        TableStatus::NoDatasetSelected => "Data".to_string(),
        TableStatus::Loading => "Data (loading...)".to_string(),
        TableStatus::Failed => "Data (failed)".to_string(),
        TableStatus::Ready => {
            let page = app.table_page().expect("ready implies a page");
            format!(
                "Data (page {}/{})",
                page.page,
                crate::view_state::last_page(page.total_count, page.page_size)
            )
        }
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    let Some(page) = app.table_page() else {
        let msg = match app.table_status() {
            TableStatus::NoDatasetSelected => {
                "No dataset selected. Tab to the dataset list, Enter to select.".to_string()
            }
            TableStatus::Failed => app
                .table_error()
                .map(|e| e.to_string())
                .unwrap_or_default(),
            _ => "Loading...".to_string(),
        };
        Paragraph::new(msg).block(block).render(area, buf);
        return;
    };

    let sort = app.view().sort.as_ref();
    let header = Row::new(
        page.columns
            .iter()
            .enumerate()
            .map(|(i, col)| header_cell(col, sort, focused && i == app.column_cursor)),
    )
    .height(1);

    let rows = page.rows.iter().map(|row| {
        Row::new(
            page.columns
                .iter()
                .map(|col| Cell::from(cell_text(row.get(col)))),
        )
    });

    let widths = column_widths(page);
    Widget::render(
        Table::new(rows, widths).header(header).block(block),
        area,
        buf,
    );
}

fn render_chart(app: &App, area: Rect, buf: &mut Buffer) {
    if let Some(projection) = app.chart_projection() {
        let view = ChartView {
            projection,
            chart_type: app.view().chart.chart_type,
        };
        (&view).render(area, buf);
        return;
    }
    let text = if let Some(e) = app.chart_error() {
        format!("Chart error: {}", e)
    } else if app.chart.is_loading() {
        "Loading chart...".to_string()
    } else {
        "No chart yet. Pick axes with x/y.".to_string()
    };
    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Chart"))
        .render(area, buf);
}

fn status_line(app: &App) -> Line<'static> {
    if let Some(msg) = &app.status_message {
        return Line::styled(msg.clone(), Style::default().fg(Color::Yellow));
    }
    if let Some(e) = app.table_error() {
        return Line::styled(format!("Table: {}", e), Style::default().fg(Color::Red));
    }
    if app.show_chart {
        if let Some(e) = app.chart_error() {
            return Line::styled(format!("Chart: {}", e), Style::default().fg(Color::Red));
        }
    }
    let view = app.view();
    let mut parts = vec![format!("page size {}", view.page_size)];
    if let Some(s) = &view.sort {
        parts.push(format!("sort {} {}", s.column, s.direction.as_param()));
    }
    if !view.filter_text.is_empty() {
        parts.push(format!("filter \"{}\"", view.filter_text));
    }
    if app.show_chart {
        let c = &view.chart;
        parts.push(format!(
            "chart {} x={} y={}",
            c.chart_type.as_str(),
            c.x_column.as_deref().unwrap_or("?"),
            c.y_column.as_deref().unwrap_or("?"),
        ));
    }
    Line::from(parts.join("  •  "))
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let outer = layout::app_layout(area);
        let main = layout::main_layout(
            outer.main_view,
            self.show_chart,
            self.prompt.is_some(),
        );

        render_datasets(self, main.sidebar, buf);
        render_table(self, main.table, buf);
        if let Some(chart_area) = main.chart {
            render_chart(self, chart_area, buf);
        }
        if let (Some(prompt_area), Some(prompt)) = (main.prompt, self.prompt.as_ref()) {
            let title = match prompt.kind {
                PromptKind::Filter => "Filter (Esc closes, applied as you type)",
                PromptKind::Upload => "Upload file path (Enter to send)",
            };
            prompt.input.render_titled(title, prompt_area, buf);
        }

        Paragraph::new(status_line(self)).render(outer.status_line, buf);

        let row_count = self.table_page().map(|p| p.total_count);
        let controls = Controls::new()
            .with_row_count(row_count)
            .with_busy(self.is_busy(), self.throbber_frame);
        (&controls).render(outer.control_bar, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cell_text_formats_json_values() {
        assert_eq!(cell_text(Some(&json!("a"))), "a");
        assert_eq!(cell_text(Some(&json!(3.5))), "3.5");
        assert_eq!(cell_text(Some(&json!(null))), "");
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&json!(true))), "true");
    }

    #[test]
    fn column_widths_clamp_to_bounds() {
        let page: TablePage = serde_json::from_value(json!({
            "data": [{"a": "x", "long": "a very very very long cell value beyond limit"}],
            "total_count": 1,
            "page": 1,
            "page_size": 10,
            "columns": ["a", "long"]
        }))
        .unwrap();
        let widths = column_widths(&page);
        assert_eq!(widths[0], Constraint::Length(7)); // clamped up to minimum
        assert_eq!(widths[1], Constraint::Length(25)); // clamped down to maximum
    }
}
