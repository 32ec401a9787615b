use std::path::PathBuf;
use std::sync::{mpsc::Sender, Arc};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub mod api;
pub mod chart_columns;
pub mod cli;
pub mod config;
pub mod fetch;
mod render;
pub mod view_state;
pub mod widgets;

pub use cli::Args;
pub use config::{AppConfig, ConfigManager};

use api::{ApiError, ChartProjection, ChartRequest, DashboardApi, DatasetRef, PageRequest, TablePage};
use chart_columns::infer_chart_columns;
use fetch::FetchSlot;
use view_state::{last_page, ViewState, PAGE_SIZES};
use widgets::text_input::TextInput;

/// Application name used for the config directory and other app-specific paths.
pub const APP_NAME: &str = "lenstui";

/// Events processed one at a time by the main loop: terminal input plus
/// completions sent back from fetch worker threads. Every completion
/// carries the key its request was issued under; `App::event` commits it
/// only while that key is still current (see `fetch::FetchSlot`).
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Dataset-list fetch finished for a refresh generation.
    DatasetsFetched(u64, Result<Vec<DatasetRef>, ApiError>),
    /// Table-page fetch finished for the request it was issued under.
    PageFetched(PageRequest, Result<TablePage, ApiError>),
    /// Chart-projection fetch finished for the request it was issued under.
    ChartFetched(ChartRequest, Result<ChartProjection, ApiError>),
    /// Upload transport finished; success triggers a dataset-list refresh.
    UploadFinished(PathBuf, Result<(), ApiError>),
    Exit,
}

/// Coarse table-stream state exposed to the render layer. Chart failures
/// are tracked separately and never show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    NoDatasetSelected,
    Loading,
    Ready,
    Failed,
}

/// Which panel receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Focus {
    Datasets,
    #[default]
    Table,
}

/// What the bottom input prompt is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptKind {
    Filter,
    Upload,
}

pub(crate) struct Prompt {
    pub(crate) kind: PromptKind,
    pub(crate) input: TextInput,
}

pub struct App {
    api: Arc<dyn DashboardApi>,
    events: Sender<AppEvent>,
    view: ViewState,
    /// Refresh generation for the dataset-list stream; bumping it is what
    /// supersedes an in-flight list fetch.
    list_generation: u64,
    pub(crate) datasets: FetchSlot<u64, Vec<DatasetRef>, ApiError>,
    pub(crate) table: FetchSlot<PageRequest, TablePage, ApiError>,
    pub(crate) chart: FetchSlot<ChartRequest, ChartProjection, ApiError>,
    /// Set while an upload refresh is pending and nothing was selected:
    /// the next committed list auto-selects its newest entry.
    select_newest_on_next_list: bool,
    upload_in_flight: bool,
    pub(crate) focus: Focus,
    pub(crate) dataset_cursor: usize,
    pub(crate) column_cursor: usize,
    pub(crate) show_chart: bool,
    pub(crate) prompt: Option<Prompt>,
    pub(crate) status_message: Option<String>,
    pub(crate) throbber_frame: u8,
    should_exit: bool,
}

impl App {
    pub fn new(api: Arc<dyn DashboardApi>, events: Sender<AppEvent>, config: &AppConfig) -> App {
        App {
            api,
            events,
            view: ViewState::with_page_size(config.display.page_size),
            list_generation: 0,
            datasets: FetchSlot::Idle,
            table: FetchSlot::Idle,
            chart: FetchSlot::Idle,
            select_newest_on_next_list: false,
            upload_in_flight: false,
            focus: Focus::Datasets,
            dataset_cursor: 0,
            column_cursor: 0,
            show_chart: false,
            prompt: None,
            status_message: None,
            throbber_frame: 0,
            should_exit: false,
        }
    }

    /// Current view intent (read model for the render layer and tests).
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Coarse table state machine, derived from the slot: no dataset →
    /// `NoDatasetSelected`; in-flight page → `Loading`; committed page →
    /// `Ready`; committed failure → `Failed`.
    pub fn table_status(&self) -> TableStatus {
        if self.view.dataset_id.is_none() {
            return TableStatus::NoDatasetSelected;
        }
        if self.table.is_loading() {
            TableStatus::Loading
        } else if self.table.error().is_some() {
            TableStatus::Failed
        } else if self.table.value().is_some() {
            TableStatus::Ready
        } else {
            TableStatus::Loading
        }
    }

    pub fn datasets(&self) -> &[DatasetRef] {
        self.datasets.value().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn table_page(&self) -> Option<&TablePage> {
        self.table.value()
    }

    pub fn table_error(&self) -> Option<&ApiError> {
        self.table.error()
    }

    pub fn chart_projection(&self) -> Option<&ChartProjection> {
        self.chart.value()
    }

    pub fn chart_error(&self) -> Option<&ApiError> {
        self.chart.error()
    }

    pub fn is_busy(&self) -> bool {
        self.datasets.is_loading()
            || self.table.is_loading()
            || self.chart.is_loading()
            || self.upload_in_flight
    }

    /// Kick off the initial dataset-list fetch. Called once after startup.
    pub fn start(&mut self) {
        self.refresh_datasets();
    }

    /// Queue an upload (e.g. from `--upload` at startup). The transport
    /// runs on a worker thread; completion arrives as `UploadFinished`.
    pub fn start_upload(&mut self, path: PathBuf) {
        self.upload_in_flight = true;
        self.status_message = Some(format!("Uploading {} ...", path.display()));
        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        std::thread::spawn(move || {
            let result = api.upload(&path);
            let _ = tx.send(AppEvent::UploadFinished(path, result));
        });
    }

    /// Handle one event. The main loop redraws after every handled event.
    pub fn event(&mut self, event: AppEvent) {
        self.throbber_frame = self.throbber_frame.wrapping_add(1);
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(..) => {}
            AppEvent::DatasetsFetched(generation, result) => {
                if self.datasets.resolve(generation, result) {
                    self.reconcile_selection();
                }
            }
            AppEvent::PageFetched(key, result) => {
                if self.table.resolve(key, result) {
                    self.on_page_committed();
                }
            }
            AppEvent::ChartFetched(key, result) => {
                // Commit or discard; a chart failure stays inside the chart
                // slot and never touches the table stream.
                let _ = self.chart.resolve(key, result);
            }
            AppEvent::UploadFinished(path, result) => self.on_upload_finished(path, result),
            AppEvent::Exit => self.should_exit = true,
        }
    }

    /// External notification that an upload completed: refresh the list
    /// and auto-select the newest entry when nothing was selected yet.
    pub fn on_upload_completed(&mut self) {
        self.select_newest_on_next_list = self.view.dataset_id.is_none();
        self.refresh_datasets();
    }

    // --- stream plumbing -------------------------------------------------

    fn refresh_datasets(&mut self) {
        self.list_generation += 1;
        let generation = self.list_generation;
        if self.datasets.ensure(generation) {
            let api = Arc::clone(&self.api);
            let tx = self.events.clone();
            std::thread::spawn(move || {
                let result = api.list_datasets();
                let _ = tx.send(AppEvent::DatasetsFetched(generation, result));
            });
        }
    }

    /// Re-issue fetches for every stream whose key no longer matches the
    /// view state. Called after each transition; redundant calls no-op
    /// inside the slots.
    fn sync_streams(&mut self) {
        let Some(dataset_id) = self.view.dataset_id.clone() else {
            self.table.clear();
            self.chart.clear();
            return;
        };

        let page_key = PageRequest {
            dataset_id: dataset_id.clone(),
            page: self.view.page,
            page_size: self.view.page_size,
            sort: self.view.sort.clone(),
            filter_text: self.view.filter_text.clone(),
        };
        if self.table.ensure(page_key.clone()) {
            let api = Arc::clone(&self.api);
            let tx = self.events.clone();
            std::thread::spawn(move || {
                let result = api.fetch_page(&page_key);
                let _ = tx.send(AppEvent::PageFetched(page_key, result));
            });
        }

        if let (Some(x), Some(y)) = (
            self.view.chart.x_column.clone(),
            self.view.chart.y_column.clone(),
        ) {
            let chart_key = ChartRequest {
                dataset_id,
                chart_type: self.view.chart.chart_type,
                x_column: x,
                y_column: y,
            };
            if self.chart.ensure(chart_key.clone()) {
                let api = Arc::clone(&self.api);
                let tx = self.events.clone();
                std::thread::spawn(move || {
                    let result = api.fetch_chart(&chart_key);
                    let _ = tx.send(AppEvent::ChartFetched(chart_key, result));
                });
            }
        }
    }

    /// After a page commit: clamp past-the-end pages, then run axis
    /// inference against the page's column set.
    fn on_page_committed(&mut self) {
        let Some(page) = self.table.value() else {
            return;
        };
        let (total, columns, rows) = (page.total_count, page.columns.clone(), page.rows.clone());

        // The service silently returns an empty page past the end; showing
        // that as success with a stale row count is what the clamp prevents.
        let last = last_page(total, self.view.page_size);
        if self.view.page > last {
            self.view = self.view.clone().set_page(last, Some(total));
            self.sync_streams();
            return;
        }

        self.column_cursor = self.column_cursor.min(columns.len().saturating_sub(1));
        let inferred = infer_chart_columns(&self.view.chart, &columns, &rows);
        if inferred != self.view.chart {
            self.view = self.view.clone().set_chart(inferred);
            self.sync_streams();
        }
    }

    /// After a list commit: keep the cursor in range and fix up a selection
    /// that no longer exists (fall back to the first dataset, or none).
    fn reconcile_selection(&mut self) {
        let refs = self.datasets().to_vec();
        self.dataset_cursor = self.dataset_cursor.min(refs.len().saturating_sub(1));

        let selection_gone = match &self.view.dataset_id {
            Some(id) => !refs.iter().any(|d| &d.id == id),
            None => self.select_newest_on_next_list,
        };
        self.select_newest_on_next_list = false;

        if selection_gone {
            match refs.first() {
                Some(first) => {
                    let id = first.id.clone();
                    self.select_dataset_at(0, &id);
                }
                None => {
                    self.view = self.view.clone().clear_dataset();
                    self.sync_streams();
                }
            }
        }
    }

    /// Select the dataset at `index`. Re-selecting the current one is a
    /// deliberate reset: the same transition runs and both per-dataset
    /// streams refetch, which is also the recovery path for a failed page.
    fn select_dataset_at(&mut self, index: usize, id: &str) {
        self.dataset_cursor = index;
        self.view = self.view.clone().select_dataset(id);
        self.column_cursor = 0;
        // Old per-dataset results would be misleading while the new fetch
        // is in flight; supersession alone would keep showing them.
        self.table.clear();
        self.chart.clear();
        self.sync_streams();
    }

    fn on_upload_finished(&mut self, path: PathBuf, result: Result<(), ApiError>) {
        self.upload_in_flight = false;
        match result {
            Ok(()) => {
                self.status_message = Some(format!("Uploaded {}", path.display()));
                self.on_upload_completed();
            }
            Err(e) => {
                self.status_message = Some(format!("Upload failed: {}", e));
            }
        }
    }

    // --- key handling ----------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_exit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Esc => {
                if self.show_chart {
                    self.show_chart = false;
                } else {
                    self.should_exit = true;
                }
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Datasets => Focus::Table,
                    Focus::Table => Focus::Datasets,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor_down(),
            KeyCode::Enter => {
                if self.focus == Focus::Datasets {
                    if let Some(d) = self.datasets().get(self.dataset_cursor) {
                        let (i, id) = (self.dataset_cursor, d.id.clone());
                        self.select_dataset_at(i, &id);
                        self.focus = Focus::Table;
                    }
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.move_column_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_column_cursor(1),
            KeyCode::PageDown | KeyCode::Char('n') => self.change_page(1),
            KeyCode::PageUp | KeyCode::Char('b') => self.change_page(-1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.cycle_page_size(1),
            KeyCode::Char('-') => self.cycle_page_size(-1),
            KeyCode::Char('s') => self.toggle_sort_on_cursor(),
            KeyCode::Char('/') => {
                let mut input = TextInput::new();
                input.set_value(&self.view.filter_text);
                self.prompt = Some(Prompt {
                    kind: PromptKind::Filter,
                    input,
                });
            }
            KeyCode::Char('c') => self.show_chart = !self.show_chart,
            KeyCode::Char('t') => {
                let next = self.view.chart.chart_type.next();
                self.view = self.view.clone().set_chart_type(next);
                self.sync_streams();
            }
            KeyCode::Char('x') => self.cycle_axis_column(true),
            KeyCode::Char('y') => self.cycle_axis_column(false),
            KeyCode::Char('u') => {
                self.prompt = Some(Prompt {
                    kind: PromptKind::Upload,
                    input: TextInput::new(),
                });
            }
            KeyCode::Char('r') => self.retry_all(),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
            }
            KeyCode::Enter => {
                let kind = prompt.kind;
                let value = prompt.input.value().to_string();
                self.prompt = None;
                if kind == PromptKind::Upload && !value.trim().is_empty() {
                    self.start_upload(PathBuf::from(value.trim()));
                }
            }
            _ => {
                let changed = prompt.input.handle_key(key);
                // Filter applies per keystroke; the slot's key equality
                // coalesces repeats and supersedes in-flight fetches.
                if changed && prompt.kind == PromptKind::Filter {
                    let text = prompt.input.value().to_string();
                    self.view = self.view.clone().set_filter_text(text);
                    self.sync_streams();
                }
            }
        }
    }

    fn move_cursor_up(&mut self) {
        if self.focus == Focus::Datasets {
            self.dataset_cursor = self.dataset_cursor.saturating_sub(1);
        }
    }

    fn move_cursor_down(&mut self) {
        if self.focus == Focus::Datasets {
            let max = self.datasets().len().saturating_sub(1);
            self.dataset_cursor = (self.dataset_cursor + 1).min(max);
        }
    }

    fn move_column_cursor(&mut self, delta: i64) {
        let n_cols = self.table.value().map(|p| p.columns.len()).unwrap_or(0);
        if n_cols == 0 {
            return;
        }
        let next = self.column_cursor as i64 + delta;
        self.column_cursor = next.clamp(0, n_cols as i64 - 1) as usize;
    }

    fn change_page(&mut self, delta: i64) {
        if self.view.dataset_id.is_none() {
            return;
        }
        let total = self.table.value().map(|p| p.total_count);
        let target = (self.view.page as i64 + delta).max(1) as usize;
        let next = self.view.clone().set_page(target, total);
        if next != self.view {
            self.view = next;
            self.sync_streams();
        }
    }

    fn cycle_page_size(&mut self, delta: i64) {
        let i = PAGE_SIZES
            .iter()
            .position(|&s| s == self.view.page_size)
            .unwrap_or(0) as i64;
        let next = (i + delta).clamp(0, PAGE_SIZES.len() as i64 - 1) as usize;
        let next_size = PAGE_SIZES[next];
        if next_size != self.view.page_size {
            self.view = self.view.clone().set_page_size(next_size);
            self.sync_streams();
        }
    }

    fn toggle_sort_on_cursor(&mut self) {
        let Some(column) = self
            .table
            .value()
            .and_then(|p| p.columns.get(self.column_cursor).cloned())
        else {
            return;
        };
        self.view = self.view.clone().set_sort(column);
        self.sync_streams();
    }

    /// Cycle the X (or Y) axis through the current column set. This is an
    /// explicit user choice; inference respects it while it stays valid.
    fn cycle_axis_column(&mut self, x_axis: bool) {
        let Some(columns) = self.table.value().map(|p| p.columns.clone()) else {
            return;
        };
        if columns.is_empty() {
            return;
        }
        let current = if x_axis {
            self.view.chart.x_column.as_deref()
        } else {
            self.view.chart.y_column.as_deref()
        };
        let i = current
            .and_then(|c| columns.iter().position(|col| col == c))
            .map(|i| (i + 1) % columns.len())
            .unwrap_or(0);
        let next = Some(columns[i].clone());
        self.view = if x_axis {
            self.view.clone().set_x_column(next)
        } else {
            self.view.clone().set_y_column(next)
        };
        self.sync_streams();
    }

    /// Explicit retry: forget per-stream failures and re-issue everything,
    /// including a fresh dataset-list generation.
    fn retry_all(&mut self) {
        self.table.retry();
        self.chart.retry();
        self.status_message = None;
        self.refresh_datasets();
        self.sync_streams();
    }
}
