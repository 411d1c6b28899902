use std::fs::OpenOptions;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::routes::AppState;

/// Appends one line per request to the configured log file before the
/// request is dispatched. A failed append never fails the request.
pub(crate) async fn log_request(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = match connect_info {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => "-".to_string(),
    };
    let line = format!(
        "\n{}    {}    {}    {}",
        Utc::now().timestamp_millis(),
        peer,
        request.method(),
        request.uri().path()
    );

    if let Err(err) = append(&state.request_log, &line) {
        log::warn!("failed to append request log: {}", err);
    }

    next.run(request).await
}

fn append(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}
