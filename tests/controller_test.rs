//! End-to-end controller tests against a mock service with controllable
//! per-request latency. Fetches run on real worker threads; the test pumps
//! the event channel the same way the main loop does, so completions
//! interleave exactly as they would in the running app.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use lenstui::api::{
    ApiError, ChartProjection, ChartRequest, DashboardApi, DatasetRef, PageRequest, Row, TablePage,
};
use lenstui::{App, AppConfig, AppEvent, TableStatus};

fn dataset(id: &str, name: &str, minute: u32) -> DatasetRef {
    DatasetRef {
        id: id.to_string(),
        display_name: name.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap(),
    }
}

fn row(name: &str, age: i64) -> Row {
    let mut row = Row::new();
    row.insert("name".to_string(), serde_json::json!(name));
    row.insert("age".to_string(), serde_json::json!(age));
    row
}

/// Mock service. Page rows encode the request that produced them
/// (`row-p{page}-f{filter}`) so a committed result identifies its fetch.
struct MockApi {
    datasets: Mutex<Vec<DatasetRef>>,
    total_count: Mutex<usize>,
    /// Latency per filter text, for racing page fetches against each other.
    page_delays: Mutex<HashMap<String, u64>>,
    chart_failure: Mutex<Option<ApiError>>,
    uploads: Mutex<Vec<String>>,
}

impl MockApi {
    fn new(datasets: Vec<DatasetRef>, total_count: usize) -> Self {
        Self {
            datasets: Mutex::new(datasets),
            total_count: Mutex::new(total_count),
            page_delays: Mutex::new(HashMap::new()),
            chart_failure: Mutex::new(None),
            uploads: Mutex::new(Vec::new()),
        }
    }

    fn set_datasets(&self, datasets: Vec<DatasetRef>) {
        *self.datasets.lock().unwrap() = datasets;
    }

    fn set_total(&self, total: usize) {
        *self.total_count.lock().unwrap() = total;
    }

    fn set_page_delay(&self, filter: &str, millis: u64) {
        self.page_delays
            .lock()
            .unwrap()
            .insert(filter.to_string(), millis);
    }

    fn fail_charts_with(&self, error: ApiError) {
        *self.chart_failure.lock().unwrap() = Some(error);
    }
}

impl DashboardApi for MockApi {
    fn list_datasets(&self) -> Result<Vec<DatasetRef>, ApiError> {
        Ok(self.datasets.lock().unwrap().clone())
    }

    fn fetch_page(&self, req: &PageRequest) -> Result<TablePage, ApiError> {
        let delay = self
            .page_delays
            .lock()
            .unwrap()
            .get(&req.filter_text)
            .copied()
            .unwrap_or(0);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        let total = *self.total_count.lock().unwrap();
        let last = total.div_ceil(req.page_size).max(1);
        let rows = if req.page > last {
            Vec::new()
        } else {
            vec![row(
                &format!("row-p{}-f{}", req.page, req.filter_text),
                req.page as i64,
            )]
        };
        Ok(TablePage {
            rows,
            total_count: total,
            page: req.page,
            page_size: req.page_size,
            columns: vec!["name".to_string(), "age".to_string()],
        })
    }

    fn fetch_chart(&self, req: &ChartRequest) -> Result<ChartProjection, ApiError> {
        if let Some(err) = self.chart_failure.lock().unwrap().clone() {
            return Err(err);
        }
        let mut point = Row::new();
        point.insert(req.x_column.clone(), serde_json::json!("a"));
        point.insert(req.y_column.clone(), serde_json::json!(1.0));
        Ok(ChartProjection {
            chart_type: req.chart_type.as_param().to_string(),
            data: vec![point],
            x_column: req.x_column.clone(),
            y_column: req.y_column.clone(),
        })
    }

    fn upload(&self, path: &Path) -> Result<(), ApiError> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.uploads.lock().unwrap().push(name.clone());
        let mut datasets = self.datasets.lock().unwrap();
        datasets.insert(0, dataset("uploaded-1", &name, 59));
        Ok(())
    }
}

struct Harness {
    app: App,
    rx: Receiver<AppEvent>,
    _tx: Sender<AppEvent>,
}

impl Harness {
    fn new(api: Arc<MockApi>) -> Self {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        let mut app = App::new(api, tx.clone(), &AppConfig::default());
        app.start();
        Self { app, rx, _tx: tx }
    }

    fn key(&mut self, code: KeyCode) {
        self.app
            .event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.key(KeyCode::Char(c));
        }
    }

    /// Deliver channel events for `millis`, like the main loop does.
    fn pump(&mut self, millis: u64) {
        let deadline = Instant::now() + Duration::from_millis(millis);
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(event) => self.app.event(event),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Pump until the list is loaded, then select the dataset under the cursor.
    fn select_first_dataset(&mut self) {
        self.pump(300);
        assert!(!self.app.datasets().is_empty(), "list fetch did not land");
        self.key(KeyCode::Enter);
        self.pump(300);
    }
}

fn default_api() -> Arc<MockApi> {
    Arc::new(MockApi::new(
        vec![dataset("d1", "sales.csv", 5), dataset("d2", "people.csv", 3)],
        42,
    ))
}

#[test]
fn selecting_a_dataset_loads_page_and_infers_chart_axes() {
    let mut h = Harness::new(default_api());
    h.select_first_dataset();

    assert_eq!(h.app.view().dataset_id.as_deref(), Some("d1"));
    assert_eq!(h.app.table_status(), TableStatus::Ready);
    let page = h.app.table_page().unwrap();
    assert_eq!(page.total_count, 42);
    assert_eq!(page.rows[0]["name"], serde_json::json!("row-p1-f"));

    // X defaults to the first column, Y to the first numeric sample.
    assert_eq!(h.app.view().chart.x_column.as_deref(), Some("name"));
    assert_eq!(h.app.view().chart.y_column.as_deref(), Some("age"));
    // And the chart stream fetched under those axes.
    let chart = h.app.chart_projection().expect("chart projection");
    assert_eq!(chart.x_column, "name");
    assert_eq!(chart.y_column, "age");
}

#[test]
fn slow_superseded_filter_fetch_never_overwrites_newer_result() {
    let api = default_api();
    // "a" resolves slowly, "ab" quickly; "ab" is issued last and must win.
    api.set_page_delay("a", 200);
    api.set_page_delay("ab", 10);
    let mut h = Harness::new(api);
    h.select_first_dataset();

    h.key(KeyCode::Char('/'));
    h.type_text("ab");
    assert_eq!(h.app.view().filter_text, "ab");

    // Let the fast fetch commit, then let the slow stale one arrive.
    h.pump(500);
    let page = h.app.table_page().unwrap();
    assert_eq!(page.rows[0]["name"], serde_json::json!("row-p1-fab"));

    h.pump(300);
    let page = h.app.table_page().unwrap();
    assert_eq!(
        page.rows[0]["name"],
        serde_json::json!("row-p1-fab"),
        "stale result for filter \"a\" overwrote the committed one"
    );
}

#[test]
fn committed_page_keeps_serving_while_a_refetch_is_in_flight() {
    let api = default_api();
    api.set_page_delay("slow", 300);
    let mut h = Harness::new(Arc::clone(&api));
    h.select_first_dataset();

    h.key(KeyCode::Char('/'));
    h.type_text("slow");

    // The new fetch is still running, but the old page stays readable:
    // the status reports loading without blanking the read model.
    assert_eq!(h.app.table_status(), TableStatus::Loading);
    let page = h.app.table_page().expect("previous page still readable");
    assert_eq!(page.rows[0]["name"], serde_json::json!("row-p1-f"));

    h.pump(600);
    assert_eq!(h.app.table_status(), TableStatus::Ready);
    let page = h.app.table_page().unwrap();
    assert_eq!(page.rows[0]["name"], serde_json::json!("row-p1-fslow"));
}

#[test]
fn reselecting_the_same_dataset_resets_view_and_refetches() {
    let mut h = Harness::new(default_api());
    h.select_first_dataset();

    h.key(KeyCode::Char('s')); // sort "name" ascending
    h.key(KeyCode::Char('/'));
    h.type_text("z");
    h.key(KeyCode::Esc);
    h.pump(300);
    assert!(h.app.view().sort.is_some());
    assert_eq!(h.app.view().filter_text, "z");

    h.key(KeyCode::Tab); // back to the dataset list, cursor still on d1
    h.key(KeyCode::Enter);
    h.pump(300);

    // Same dataset, full transition: page, sort, and filter reset, and
    // the page was fetched fresh without the old filter.
    assert_eq!(h.app.view().dataset_id.as_deref(), Some("d1"));
    assert_eq!(h.app.view().page, 1);
    assert!(h.app.view().sort.is_none());
    assert!(h.app.view().filter_text.is_empty());
    assert_eq!(h.app.table_status(), TableStatus::Ready);
    let page = h.app.table_page().unwrap();
    assert_eq!(page.rows[0]["name"], serde_json::json!("row-p1-f"));
}

#[test]
fn sort_key_resets_page_and_cycles_tri_state() {
    let mut h = Harness::new(default_api());
    h.select_first_dataset();

    h.key(KeyCode::Char('n')); // page 2
    h.pump(300);
    assert_eq!(h.app.view().page, 2);

    h.key(KeyCode::Char('s')); // sort on cursor column ("name"), ascending
    assert_eq!(h.app.view().page, 1);
    let sort = h.app.view().sort.clone().unwrap();
    assert_eq!(sort.column, "name");
    assert_eq!(sort.direction.as_param(), "asc");

    h.key(KeyCode::Char('s'));
    assert_eq!(
        h.app.view().sort.clone().unwrap().direction.as_param(),
        "desc"
    );

    h.key(KeyCode::Char('s'));
    assert!(h.app.view().sort.is_none());
    h.pump(300);
    assert_eq!(h.app.table_status(), TableStatus::Ready);
}

#[test]
fn chart_failure_leaves_ready_table_untouched() {
    let api = default_api();
    api.fail_charts_with(ApiError::InvalidColumn("bad column".into()));
    let mut h = Harness::new(api);
    h.select_first_dataset();

    assert_eq!(h.app.table_status(), TableStatus::Ready);
    let before = h.app.table_page().unwrap().clone();

    assert_eq!(
        h.app.chart_error(),
        Some(&ApiError::InvalidColumn("bad column".into()))
    );
    assert!(h.app.chart_projection().is_none());
    // Failure isolation: the table stream did not move.
    assert_eq!(h.app.table_status(), TableStatus::Ready);
    assert_eq!(h.app.table_page().unwrap(), &before);
}

#[test]
fn page_past_the_end_is_clamped_and_refetched() {
    let api = default_api();
    let mut h = Harness::new(Arc::clone(&api));
    h.select_first_dataset();

    h.key(KeyCode::Char('n')); // page 2 of 42 rows
    h.pump(300);
    assert_eq!(h.app.view().page, 2);

    // Rows shrink behind our back; only page 1 exists now. Paging forward
    // commits an empty past-the-end result, which must clamp and refetch.
    api.set_total(5);
    h.key(KeyCode::Char('n'));
    h.pump(500);

    assert_eq!(h.app.view().page, 1, "page was not clamped to the new end");
    let page = h.app.table_page().unwrap();
    assert_eq!(page.total_count, 5);
    assert_eq!(page.rows[0]["name"], serde_json::json!("row-p1-f"));
}

#[test]
fn removed_selection_falls_back_to_first_dataset() {
    let api = default_api();
    let mut h = Harness::new(Arc::clone(&api));
    h.select_first_dataset();
    assert_eq!(h.app.view().dataset_id.as_deref(), Some("d1"));

    h.key(KeyCode::Char('/'));
    h.type_text("abc");
    h.key(KeyCode::Esc);
    h.pump(300);

    api.set_datasets(vec![dataset("d2", "people.csv", 3)]);
    h.key(KeyCode::Char('r')); // refresh
    h.pump(300);

    assert_eq!(h.app.view().dataset_id.as_deref(), Some("d2"));
    // Fallback selection is a dataset switch: sort and filter reset.
    assert!(h.app.view().sort.is_none());
    assert!(h.app.view().filter_text.is_empty());
    assert_eq!(h.app.table_status(), TableStatus::Ready);
}

#[test]
fn empty_list_clears_selection() {
    let api = default_api();
    let mut h = Harness::new(Arc::clone(&api));
    h.select_first_dataset();

    api.set_datasets(Vec::new());
    h.key(KeyCode::Char('r'));
    h.pump(300);

    assert_eq!(h.app.view().dataset_id, None);
    assert_eq!(h.app.table_status(), TableStatus::NoDatasetSelected);
    assert!(h.app.table_page().is_none());
}

#[test]
fn upload_refreshes_list_and_auto_selects_newest_when_nothing_selected() {
    let api = default_api();
    let mut h = Harness::new(Arc::clone(&api));
    h.pump(300); // list loaded, nothing selected yet

    h.app.start_upload("/tmp/fresh.csv".into());
    h.pump(500);

    assert_eq!(api.uploads.lock().unwrap().as_slice(), ["fresh.csv"]);
    assert_eq!(h.app.view().dataset_id.as_deref(), Some("uploaded-1"));
    assert_eq!(h.app.table_status(), TableStatus::Ready);
}

#[test]
fn upload_keeps_existing_selection() {
    let api = default_api();
    let mut h = Harness::new(Arc::clone(&api));
    h.select_first_dataset();

    h.app.start_upload("/tmp/fresh.csv".into());
    h.pump(500);

    // d1 is still present and still selected; the new dataset is listed.
    assert_eq!(h.app.view().dataset_id.as_deref(), Some("d1"));
    assert_eq!(h.app.datasets().first().unwrap().id, "uploaded-1");
}

#[test]
fn explicit_axis_choice_survives_refetch() {
    let mut h = Harness::new(default_api());
    h.select_first_dataset();
    assert_eq!(h.app.view().chart.y_column.as_deref(), Some("age"));

    // Cycle Y to the next column ("name" -> wraps from "age").
    h.key(KeyCode::Char('y'));
    h.pump(300);
    let chosen = h.app.view().chart.y_column.clone().unwrap();
    assert_eq!(chosen, "name");

    // A refetch (new sort) re-runs inference; the valid choice stays.
    h.key(KeyCode::Char('s'));
    h.pump(300);
    assert_eq!(h.app.view().chart.y_column.as_deref(), Some("name"));
}
