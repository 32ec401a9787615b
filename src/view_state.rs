//! User view intent: selected dataset, pagination, sort, filter, and chart axes.
//!
//! All transitions are pure (take `self`, return a new state) so every
//! state-change site goes through one canonical contract. The page-reset
//! rule lives here and nowhere else: changing dataset, sort, filter, or
//! page size always lands the user back on page 1.

/// Allowed page sizes, in the order they cycle with +/-.
pub const PAGE_SIZES: [usize; 4] = [5, 10, 25, 50];

/// Sort direction for a server-side sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Query-parameter value understood by the data service.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    /// Arrow glyph for the table header.
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

/// Active sort: column name plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Chart projection type offered by the data service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
}

impl ChartType {
    pub const ALL: [Self; 3] = [Self::Bar, Self::Line, Self::Pie];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "Bar",
            Self::Line => "Line",
            Self::Pie => "Pie",
        }
    }

    /// Query-parameter value understood by the data service.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
        }
    }

    /// Next type in `ALL`, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Chart axes selection. Either axis may be unset until a page arrives
/// and inference fills it in (see `chart_columns`).
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
}

/// Snapshot of everything the user currently wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub dataset_id: Option<String>,
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub filter_text: String,
    pub chart: ChartSpec,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            dataset_id: None,
            page: 1,
            page_size: 10,
            sort: None,
            filter_text: String::new(),
            chart: ChartSpec::default(),
        }
    }
}

impl ViewState {
    /// Initial state with a configured default page size. Sizes outside
    /// `PAGE_SIZES` fall back to the default.
    pub fn with_page_size(page_size: usize) -> Self {
        let page_size = if PAGE_SIZES.contains(&page_size) {
            page_size
        } else {
            Self::default().page_size
        };
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Switch to another dataset. Sort and filter belong to the old
    /// dataset's columns, so both are cleared; chart axes are left for
    /// inference to validate against the new column set.
    #[must_use]
    pub fn select_dataset(self, id: impl Into<String>) -> Self {
        Self {
            dataset_id: Some(id.into()),
            page: 1,
            sort: None,
            filter_text: String::new(),
            ..self
        }
    }

    /// Drop the dataset selection (the service no longer lists anything).
    /// Per-dataset intent goes with it, mirroring `select_dataset`; chart
    /// axes are left for the next inference pass.
    #[must_use]
    pub fn clear_dataset(self) -> Self {
        Self {
            dataset_id: None,
            page: 1,
            sort: None,
            filter_text: String::new(),
            ..self
        }
    }

    /// Jump to page `n` (1-based). When the total row count is known the
    /// caller passes it and the page is clamped to the last valid page;
    /// before any page has arrived, any positive page is accepted and
    /// corrected once a result comes back.
    #[must_use]
    pub fn set_page(self, n: usize, total_count: Option<usize>) -> Self {
        let mut page = n.max(1);
        if let Some(total) = total_count {
            page = page.min(last_page(total, self.page_size));
        }
        Self { page, ..self }
    }

    /// Change the page size (must be one of `PAGE_SIZES`; anything else
    /// is ignored). Resets to page 1. Filter text is intentionally kept.
    #[must_use]
    pub fn set_page_size(self, n: usize) -> Self {
        if !PAGE_SIZES.contains(&n) {
            return self;
        }
        Self {
            page: 1,
            page_size: n,
            ..self
        }
    }

    /// Tri-state sort toggle. Repeated on the same column:
    /// none → ascending → descending → none. A different column starts
    /// over at ascending. Resets to page 1.
    #[must_use]
    pub fn set_sort(self, column: impl Into<String>) -> Self {
        let column = column.into();
        let sort = match self.sort {
            Some(ref s) if s.column == column => match s.direction {
                SortDirection::Ascending => Some(SortSpec {
                    column,
                    direction: SortDirection::Descending,
                }),
                SortDirection::Descending => None,
            },
            _ => Some(SortSpec {
                column,
                direction: SortDirection::Ascending,
            }),
        };
        Self {
            page: 1,
            sort,
            ..self
        }
    }

    /// Replace the free-text filter. Resets to page 1. Coalescing of
    /// rapid keystrokes is the fetch layer's job; no characters are
    /// dropped here.
    #[must_use]
    pub fn set_filter_text(self, s: impl Into<String>) -> Self {
        Self {
            page: 1,
            filter_text: s.into(),
            ..self
        }
    }

    /// Replace the whole chart spec (inference output). Like the other
    /// chart operations this never touches pagination.
    #[must_use]
    pub fn set_chart(self, chart: ChartSpec) -> Self {
        Self { chart, ..self }
    }

    /// Change the chart type. Chart operations never touch pagination.
    #[must_use]
    pub fn set_chart_type(self, t: ChartType) -> Self {
        Self {
            chart: ChartSpec {
                chart_type: t,
                ..self.chart.clone()
            },
            ..self
        }
    }

    #[must_use]
    pub fn set_x_column(self, c: Option<String>) -> Self {
        Self {
            chart: ChartSpec {
                x_column: c,
                ..self.chart.clone()
            },
            ..self
        }
    }

    #[must_use]
    pub fn set_y_column(self, c: Option<String>) -> Self {
        Self {
            chart: ChartSpec {
                y_column: c,
                ..self.chart.clone()
            },
            ..self
        }
    }
}

/// Last valid 1-based page for a row count (at least 1, even when empty).
pub fn last_page(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1)).max(1)
}
