use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Request counters shared by all handlers.
#[derive(Debug, Clone, Default)]
pub struct ServerMetrics {
    total_requests: Arc<AtomicU64>,
    embeds: Arc<AtomicU64>,
    detections: Arc<AtomicU64>,
    duplicate_rejections: Arc<AtomicU64>,
    failed_requests: Arc<AtomicU64>,
    avg_response_time: Arc<AtomicU64>, // In milliseconds
}

/// Point-in-time copy of [`ServerMetrics`] for the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub embeds: u64,
    pub detections: u64,
    pub duplicate_rejections: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: u64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_embeds(&self) {
        self.embeds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_detections(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicate_rejections(&self) {
        self.duplicate_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed_requests(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_response_time(&self, new_time_ms: f64) {
        let current = self.avg_response_time.load(Ordering::Relaxed) as f64;
        let updated = if current == 0.0 {
            new_time_ms
        } else {
            current * 0.9 + new_time_ms * 0.1 // Exponential moving average
        };
        self.avg_response_time
            .store(updated as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            embeds: self.embeds.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            duplicate_rejections: self.duplicate_rejections.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_response_time_ms: self.avg_response_time.load(Ordering::Relaxed),
        }
    }
}
