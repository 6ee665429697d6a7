//! Health check handler
//!
//! Reports liveness plus process memory for load balancers and monitoring.

use axum::{extract::State, Json};
use serde::Serialize;
use sysinfo::{ProcessesToUpdate, System};

use crate::{services::timezone::current_jakarta_time, state::AppState};

/// Public health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Always "OK"
    pub status: &'static str,
    /// Current time at +07:00
    pub timestamp: String,
    pub environment: String,
    /// Seconds since the server started
    pub uptime: f64,
    pub memory: MemoryUsage,
}

/// Memory figures in bytes
#[derive(Debug, Default, Serialize)]
pub struct MemoryUsage {
    /// Resident set size of this process
    pub rss: u64,
    /// Virtual memory of this process
    #[serde(rename = "virtual")]
    pub virtual_bytes: u64,
    pub total_system: u64,
}

fn memory_usage() -> MemoryUsage {
    let mut system = System::new();
    system.refresh_memory();

    let mut usage = MemoryUsage {
        total_system: system.total_memory(),
        ..Default::default()
    };

    match sysinfo::get_current_pid() {
        Ok(pid) => {
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            if let Some(process) = system.process(pid) {
                usage.rss = process.memory();
                usage.virtual_bytes = process.virtual_memory();
            }
        }
        Err(e) => tracing::debug!(error = %e, "Current pid unavailable"),
    }

    usage
}

/// GET /health
///
/// # Example
/// ```bash
/// curl http://localhost:3001/health
/// # {"status":"OK","timestamp":"2024-01-01T10:00:00.000000+07:00","environment":"development",
/// #  "uptime":12.5,"memory":{"rss":...,"virtual":...,"total_system":...}}
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    tracing::debug!(operation = "health_check", "Health check requested");

    Json(HealthCheckResponse {
        status: "OK",
        timestamp: current_jakarta_time(),
        environment: state.config.environment.clone(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        memory: memory_usage(),
    })
}
