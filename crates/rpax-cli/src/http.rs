//! Read-only status endpoint, restricted to loopback binding.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Clone)]
pub struct StatusState {
    pub lake_root: std::path::PathBuf,
    pub project_count: usize,
    pub started_at: Instant,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct StatusResponse {
    lake_root: String,
    project_count: usize,
    uptime_seconds: u64,
    pid: u32,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn status(State(state): State<Arc<StatusState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        lake_root: state.lake_root.display().to_string(),
        project_count: state.project_count,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        pid: std::process::id(),
    })
}

/// Bind the status endpoint to `addr`, rejecting anything not loopback.
///
/// Rejection happens before any socket is opened (spec.md §6: "bind
/// address is validated to reject any non-loopback").
pub async fn serve(addr: SocketAddr, state: StatusState) -> anyhow::Result<()> {
    if !addr.ip().is_loopback() {
        anyhow::bail!("refusing to bind status endpoint to non-loopback address {}", addr.ip());
    }
    if !(1024..65535).contains(&addr.port()) {
        anyhow::bail!("status endpoint port {} must be in 1024..65535", addr.port());
    }

    let shared = Arc::new(state);
    let app = Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(shared);

    info!("status endpoint listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Parse and validate a user-supplied bind address string as loopback.
pub fn parse_loopback_addr(raw: &str) -> anyhow::Result<SocketAddr> {
    let addr: SocketAddr = raw.parse().map_err(|e| anyhow::anyhow!("invalid bind address '{raw}': {e}"))?;
    if !matches!(addr.ip(), IpAddr::V4(v4) if v4.is_loopback()) && !matches!(addr.ip(), IpAddr::V6(v6) if v6.is_loopback()) {
        anyhow::bail!("bind address '{raw}' is not loopback");
    }
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_loopback_v4() {
        assert!(parse_loopback_addr("127.0.0.1:8080").is_ok());
    }

    #[test]
    fn rejects_non_loopback() {
        assert!(parse_loopback_addr("0.0.0.0:8080").is_err());
        assert!(parse_loopback_addr("10.0.0.5:8080").is_err());
    }
}
