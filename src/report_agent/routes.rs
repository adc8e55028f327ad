//! HTTP surface of the report agent: health probe, inline viewing, downloads.
//!
//! Generated workbooks are served two ways. `/files/{name}` hands the bytes
//! to [`ServeDir`] so browsers can open them inline, while
//! `/download/{name}` forces a download via `Content-Disposition`. Both only
//! ever see plain file names; anything that could escape the reports
//! directory is answered with the same JSON 404 as a missing file.

use std::path::PathBuf;

use axum::Router;
use axum::extract::{Path as FileName, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde_json::{Value, json};
use tower_http::services::ServeDir;

/// MIME type for `.xlsx` workbooks.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Builds the file-serving routes rooted at `reports_dir`.
pub fn http_router(reports_dir: PathBuf) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/download/{filename}", get(download))
        .nest_service("/files", ServeDir::new(reports_dir.clone()))
        .with_state(reports_dir)
}

async fn ping() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Streams a generated report as an attachment.
///
/// Unknown names, traversal attempts and unreadable files all collapse to
/// the same 404 so probing clients learn nothing about the directory.
async fn download(
    State(reports_dir): State<PathBuf>,
    FileName(filename): FileName<String>,
) -> Response {
    if !is_safe_file_name(&filename) {
        return not_found(&filename);
    }
    let path = reports_dir.join(&filename);
    let Ok(bytes) = tokio::fs::read(&path).await else {
        return not_found(&filename);
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE));
    let disposition = format!("attachment; filename=\"{filename}\"");
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(_) => return not_found(&filename),
    }
    (headers, bytes).into_response()
}

fn not_found(filename: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": format!("Report not found: {filename}")})),
    )
        .into_response()
}

/// Accepts only names the report generator itself could have produced.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
