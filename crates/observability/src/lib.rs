use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    chat_requests_total: AtomicU64,
    completion_success_total: AtomicU64,
    fallback_total: AtomicU64,
    buyers_created_total: AtomicU64,
    sellers_created_total: AtomicU64,
    total_chat_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub chat_requests_total: u64,
    pub completion_success_total: u64,
    pub fallback_total: u64,
    pub buyers_created_total: u64,
    pub sellers_created_total: u64,
    pub avg_chat_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_chat_request(&self) {
        self.chat_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_completion_success(&self) {
        self.completion_success_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback(&self) {
        self.fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_buyer_created(&self) {
        self.buyers_created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_seller_created(&self) {
        self.sellers_created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_chat_latency(&self, duration: Duration) {
        self.total_chat_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let chats = self.chat_requests_total.load(Ordering::Relaxed);
        let latency = self.total_chat_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            chat_requests_total: chats,
            completion_success_total: self.completion_success_total.load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            buyers_created_total: self.buyers_created_total.load(Ordering::Relaxed),
            sellers_created_total: self.sellers_created_total.load(Ordering::Relaxed),
            avg_chat_latency_millis: if chats == 0 {
                0.0
            } else {
                latency as f64 / chats as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,estate_api=info,estate_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
