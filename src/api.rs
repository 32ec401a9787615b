//! Remote dashboard service client.
//!
//! Wire models mirror the service's JSON schemas (`GET /files/`,
//! `GET /data/{id}`, `GET /charts/{id}`, `POST /uploadfile/`). Errors are
//! classified into `ApiError` by matching transport errors and HTTP status
//! codes rather than parsing message strings, so the rest of the app never
//! sees a raw transport error.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::view_state::{ChartType, SortSpec};

/// One uploaded dataset as listed by the service (newest first).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetRef {
    pub id: String,
    #[serde(rename = "original_filename")]
    pub display_name: String,
    #[serde(rename = "upload_date")]
    pub created_at: DateTime<Utc>,
}

/// A table row: column name to JSON value, ordered by column name.
pub type Row = BTreeMap<String, Value>;

/// One page of rows for a (dataset, page, page_size, sort, filter) request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TablePage {
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub columns: Vec<String>,
}

/// Grouped chart data for a (dataset, type, x, y) request. The service
/// groups rows by `x_column` and sums `y_column` as a double.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartProjection {
    pub chart_type: String,
    pub data: Vec<Row>,
    pub x_column: String,
    pub y_column: String,
}

impl ChartProjection {
    /// Label/value pairs in service order. Rows with a non-numeric y
    /// (the service should not produce any) are skipped.
    pub fn points(&self) -> Vec<(String, f64)> {
        self.data
            .iter()
            .filter_map(|row| {
                let y = row.get(&self.y_column)?.as_f64()?;
                let x = match row.get(&self.x_column) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => "<null>".to_string(),
                    Some(other) => other.to_string(),
                };
                Some((x, y))
            })
            .collect()
    }
}

/// Classified request failure. Each fetch stream keeps its own value so
/// one stream's failure never disturbs another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport-level failure (DNS, refused connection, timeout).
    NetworkFailure(String),
    /// Dataset id unknown to the service.
    NotFound,
    /// Page or page size outside the service's accepted bounds.
    InvalidRequest(String),
    /// Chart column absent from the dataset's schema, or no numeric data.
    InvalidColumn(String),
    /// Anything else (5xx, malformed body).
    Unknown(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFailure(msg) => write!(f, "Network failure: {}", msg),
            Self::NotFound => write!(f, "Dataset not found on the service"),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::InvalidColumn(msg) => write!(f, "Invalid chart column: {}", msg),
            Self::Unknown(msg) => write!(f, "Service error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Which endpoint produced a failure. 400s from the chart route mean a bad
/// column choice; 400s from the data route mean bad paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Files,
    Data,
    Charts,
    Upload,
}

/// Detail string from a FastAPI error body (`{"detail": "..."}`),
/// falling back to the raw body or status text.
fn error_detail(body: &str, status: u16) -> String {
    #[derive(Deserialize)]
    struct Detail {
        detail: Value,
    }
    match serde_json::from_str::<Detail>(body) {
        Ok(d) => match d.detail {
            Value::String(s) => s,
            other => other.to_string(),
        },
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("HTTP {}", status),
    }
}

fn classify_status(endpoint: Endpoint, status: u16, body: &str) -> ApiError {
    let detail = error_detail(body, status);
    match status {
        404 => ApiError::NotFound,
        400 | 422 => match endpoint {
            Endpoint::Charts => ApiError::InvalidColumn(detail),
            _ => ApiError::InvalidRequest(detail),
        },
        _ => ApiError::Unknown(detail),
    }
}

fn classify(endpoint: Endpoint, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            classify_status(endpoint, status, &body)
        }
        ureq::Error::Transport(t) => ApiError::NetworkFailure(t.to_string()),
    }
}

/// Parameters for one table-page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub dataset_id: String,
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub filter_text: String,
}

/// Parameters for one chart-projection request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub dataset_id: String,
    pub chart_type: ChartType,
    pub x_column: String,
    pub y_column: String,
}

/// The three idempotent read endpoints plus the upload transport.
/// Object-safe so the controller can hold a mock in tests.
pub trait DashboardApi: Send + Sync {
    fn list_datasets(&self) -> Result<Vec<DatasetRef>, ApiError>;
    fn fetch_page(&self, req: &PageRequest) -> Result<TablePage, ApiError>;
    fn fetch_chart(&self, req: &ChartRequest) -> Result<ChartProjection, ApiError>;
    fn upload(&self, path: &Path) -> Result<(), ApiError>;
}

/// HTTP implementation over `ureq` with a shared agent.
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
    user_email: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration, user_email: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent,
            base_url,
            user_email,
        }
    }

    fn get(&self, path: &str) -> ureq::Request {
        let req = self.agent.get(&format!("{}{}", self.base_url, path));
        match &self.user_email {
            Some(email) => req.set("user-email", email),
            None => req,
        }
    }

    fn read_json<T: for<'de> Deserialize<'de>>(response: ureq::Response) -> Result<T, ApiError> {
        response
            .into_json::<T>()
            .map_err(|e| ApiError::Unknown(format!("malformed response body: {}", e)))
    }
}

impl DashboardApi for HttpApi {
    fn list_datasets(&self) -> Result<Vec<DatasetRef>, ApiError> {
        let response = self
            .get("/files/")
            .call()
            .map_err(|e| classify(Endpoint::Files, e))?;
        Self::read_json(response)
    }

    fn fetch_page(&self, req: &PageRequest) -> Result<TablePage, ApiError> {
        let mut request = self
            .get(&format!("/data/{}", req.dataset_id))
            .query("page", &req.page.to_string())
            .query("page_size", &req.page_size.to_string());
        if let Some(sort) = &req.sort {
            request = request
                .query("sort_by", &sort.column)
                .query("sort_order", sort.direction.as_param());
        }
        if !req.filter_text.is_empty() {
            request = request.query("search_query", &req.filter_text);
        }
        let response = request.call().map_err(|e| classify(Endpoint::Data, e))?;
        Self::read_json(response)
    }

    fn fetch_chart(&self, req: &ChartRequest) -> Result<ChartProjection, ApiError> {
        let response = self
            .get(&format!("/charts/{}", req.dataset_id))
            .query("chart_type", req.chart_type.as_param())
            .query("x_column", &req.x_column)
            .query("y_column", &req.y_column)
            .call()
            .map_err(|e| classify(Endpoint::Charts, e))?;
        Self::read_json(response)
    }

    fn upload(&self, path: &Path) -> Result<(), ApiError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidRequest("upload path has no file name".into()))?
            .to_string();
        let content = std::fs::read(path)
            .map_err(|e| ApiError::InvalidRequest(format!("cannot read {}: {}", path.display(), e)))?;

        // ureq has no multipart helper; the body is small enough to build by hand.
        let boundary = format!("----lenstui-{:016x}", std::process::id() as u64 ^ 0x5eed);
        let mut body = Vec::with_capacity(content.len() + 256);
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(&content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let mut request = self
            .agent
            .post(&format!("{}/uploadfile/", self.base_url))
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            );
        if let Some(email) = &self.user_email {
            request = request.set("user-email", email);
        }
        let response = request
            .send_bytes(&body)
            .map_err(|e| classify(Endpoint::Upload, e))?;
        // Drain the acknowledgment body; its message text is not used.
        let mut sink = String::new();
        let _ = response.into_reader().read_to_string(&mut sink);
        Ok(())
    }
}
