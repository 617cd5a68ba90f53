use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Fixed one-second window over the whole route group. Good enough to keep a
/// classroom of clients from hammering the answer-save endpoint.
#[derive(Clone, Debug)]
pub struct RateLimit {
    inner: Arc<Window>,
}

#[derive(Debug)]
struct Window {
    rps: u32,
    epoch: Instant,
    window_start_ms: AtomicU64,
    count: AtomicU32,
}

impl RateLimit {
    pub fn per_second(rps: u32) -> Self {
        Self {
            inner: Arc::new(Window {
                rps: rps.max(1),
                epoch: Instant::now(),
                window_start_ms: AtomicU64::new(0),
                count: AtomicU32::new(0),
            }),
        }
    }

    fn check(&self) -> bool {
        let w = &self.inner;
        let elapsed_ms = w.epoch.elapsed().as_millis() as u64;
        let start = w.window_start_ms.load(Ordering::Acquire);
        if elapsed_ms.saturating_sub(start) >= Duration::from_secs(1).as_millis() as u64 {
            // Roll the window; the racing loser just counts into the fresh one.
            if w.window_start_ms
                .compare_exchange(start, elapsed_ms, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                w.count.store(0, Ordering::Release);
            }
        }
        w.count.fetch_add(1, Ordering::AcqRel) < w.rps
    }
}

pub async fn rps_middleware(
    State(limit): State<RateLimit>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limit.check() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimit {
    RateLimit::per_second(rps)
}
