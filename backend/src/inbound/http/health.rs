//! Readiness and liveness probes.
//!
//! ```text
//! GET /health/ready -> {"probe":"ready","ok":true}
//! GET /health/live  -> {"probe":"live","ok":true}
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;

/// Process health shared with the probes.
///
/// The server starts live but not ready; `create_server` flips readiness
/// once the socket is bound.
#[derive(Debug)]
pub struct HealthState {
    ready: AtomicBool,
    draining: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            draining: AtomicBool::new(false),
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness from now on, so orchestrators stop routing here.
    pub fn mark_unhealthy(&self) {
        self.draining.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        !self.draining.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Probe {
    Ready,
    Live,
}

#[derive(Serialize)]
struct ProbeReport {
    probe: Probe,
    ok: bool,
}

fn report(probe: Probe, ok: bool) -> HttpResponse {
    let mut response = if ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(ProbeReport { probe, ok })
}

/// Whether the server accepts traffic.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Accepting traffic"),
        (status = 503, description = "Still starting")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    report(Probe::Ready, state.is_ready())
}

/// Whether the process should keep running.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is healthy"),
        (status = 503, description = "Process is draining")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    report(Probe::Live, state.is_alive())
}
