//! Bottom control bar: key hints, total row count, and a busy throbber.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget},
};

#[derive(Default)]
pub struct Controls {
    pub row_count: Option<usize>,
    pub busy: bool,
    /// Spinner frame (0..3).
    pub throbber_frame: u8,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_count(mut self, row_count: Option<usize>) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_busy(mut self, busy: bool, throbber_frame: u8) -> Self {
        self.busy = busy;
        self.throbber_frame = throbber_frame;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = Color::Indexed(236);
        Block::default()
            .style(Style::default().bg(bg))
            .render(area, buf);

        const DEFAULT_CONTROLS: [(&str, &str); 10] = [
            ("Tab", "Focus"),
            ("/", "Filter"),
            ("s", "Sort"),
            ("n/b", "Page"),
            ("+/-", "Size"),
            ("c", "Chart"),
            ("t", "Type"),
            ("u", "Upload"),
            ("r", "Refresh"),
            ("q", "Quit"),
        ];

        // Width of one key-label pair (fixed; pairs are never shrunk).
        let pair_width = |(key, action): &(&str, &str)| -> u16 {
            (key.chars().count() as u16 + 1) + (action.chars().count() as u16 + 1)
        };

        // Reserve space for fill, row count, and throbber so layout never shifts.
        const THROBBER_WIDTH: u16 = 3;
        let right_reserved = (if self.row_count.is_some() { 21 } else { 1 }) + THROBBER_WIDTH;
        let mut available = area.width.saturating_sub(right_reserved);

        let mut n_show = 0;
        for pair in DEFAULT_CONTROLS.iter() {
            let need = pair_width(pair);
            if available >= need {
                available -= need;
                n_show += 1;
            } else {
                break;
            }
        }

        let mut constraints: Vec<Constraint> = DEFAULT_CONTROLS
            .iter()
            .take(n_show)
            .flat_map(|(key, action)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 1),
                    Constraint::Length(action.chars().count() as u16 + 1),
                ]
            })
            .collect();

        constraints.push(Constraint::Fill(1));
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(20));
        }
        constraints.push(Constraint::Length(THROBBER_WIDTH));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let base = Style::default().bg(bg);
        let key_style = base.fg(Color::Cyan);
        let label_style = base.fg(Color::White);

        for (i, (key, action)) in DEFAULT_CONTROLS.iter().take(n_show).enumerate() {
            let j = i * 2;
            Paragraph::new(*key).style(key_style).render(layout[j], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[j + 1], buf);
        }

        let fill_idx = n_show * 2;
        if let Some(count) = self.row_count {
            let row_count_text = format!("Rows: {}", format_number_with_commas(count));
            Paragraph::new(row_count_text)
                .style(label_style)
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }

        // Throbber slot is always present (fixed width); animate only when busy.
        const THROBBER: [char; 4] = ['|', '/', '-', '\\'];
        let throbber_idx = fill_idx + if self.row_count.is_some() { 2 } else { 1 };
        let throbber_ch = if self.busy {
            THROBBER[self.throbber_frame as usize % 4].to_string()
        } else {
            " ".to_string()
        };
        Paragraph::new(throbber_ch)
            .style(base.fg(Color::Cyan))
            .centered()
            .render(layout[throbber_idx], buf);
    }
}

fn format_number_with_commas(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().rev().collect();

    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*ch);
    }

    result.chars().rev().collect()
}
