use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Top-level layout: main view (fill), status line, control bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub main_view: Rect,
    pub status_line: Rect,
    pub control_bar: Rect,
}

pub fn app_layout(area: Rect) -> AppLayout {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    AppLayout {
        main_view: layout[0],
        status_line: layout[1],
        control_bar: layout[2],
    }
}

/// Main view internals: dataset sidebar on the left, content on the right,
/// optional chart pane below the table, optional prompt strip at the bottom.
#[derive(Debug, Clone, Copy)]
pub struct MainLayout {
    pub sidebar: Rect,
    pub table: Rect,
    pub chart: Option<Rect>,
    pub prompt: Option<Rect>,
}

/// Sidebar width; enough for a filename plus an upload date.
const SIDEBAR_WIDTH: u16 = 34;
const PROMPT_HEIGHT: u16 = 3;

pub fn main_layout(area: Rect, chart_visible: bool, prompt_visible: bool) -> MainLayout {
    let (content_region, prompt) = if prompt_visible {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(PROMPT_HEIGHT)])
            .split(area);
        (layout[0], Some(layout[1]))
    } else {
        (area, None)
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(content_region);
    let sidebar = columns[0];
    let content = columns[1];

    let (table, chart) = if chart_visible {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(content);
        (rows[0], Some(rows[1]))
    } else {
        (content, None)
    };

    MainLayout {
        sidebar,
        table,
        chart,
        prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_layout_reserves_two_bottom_rows() {
        let l = app_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(l.main_view.height, 22);
        assert_eq!(l.status_line.height, 1);
        assert_eq!(l.control_bar.height, 1);
    }

    #[test]
    fn chart_splits_content_and_prompt_takes_bottom() {
        let area = Rect::new(0, 0, 120, 40);
        let l = main_layout(area, true, true);
        assert_eq!(l.sidebar.width, 34);
        let chart = l.chart.expect("chart pane");
        let prompt = l.prompt.expect("prompt strip");
        assert_eq!(prompt.height, 3);
        assert_eq!(l.table.height + chart.height + prompt.height, 40);
    }

    #[test]
    fn no_panes_when_hidden() {
        let l = main_layout(Rect::new(0, 0, 80, 24), false, false);
        assert!(l.chart.is_none());
        assert!(l.prompt.is_none());
    }
}
