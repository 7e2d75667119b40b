//! Per-client rate limiting middleware

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::RwLock, task::JoinHandle};

use super::client_ip;
use crate::error::ErrorResponse;

/// Past this many tracked clients, idle buckets are evicted on insert
const MAX_TRACKED_CLIENTS: usize = 10_000;
pub const IDLE_BUCKET_AGE: Duration = Duration::from_secs(60);

/// Token bucket for one client
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, refill_per_second: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_per_second).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rate limiter state, shared across requests
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
    refill_per_second: f64,
    capacity: f64,
}

impl RateLimiter {
    /// `requests_per_second` sustained, with bursts of twice that
    pub fn new(requests_per_second: u32) -> Self {
        let rps = requests_per_second.max(1) as f64;
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            refill_per_second: rps,
            capacity: rps * 2.0,
        }
    }

    /// Check if a request is allowed
    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.write().await;

        if buckets.len() >= MAX_TRACKED_CLIENTS && !buckets.contains_key(key) {
            evict_idle(&mut buckets, IDLE_BUCKET_AGE);
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));

        bucket.try_consume(self.refill_per_second, self.capacity)
    }

    /// Drop buckets idle for longer than `max_age`
    pub async fn cleanup(&self, max_age: Duration) {
        let mut buckets = self.buckets.write().await;
        evict_idle(&mut buckets, max_age);
    }

    /// Sweep idle buckets every `every` on a background task
    pub fn spawn_cleanup(&self, every: Duration, max_age: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                limiter.cleanup(max_age).await;
            }
        })
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }
}

fn evict_idle(buckets: &mut HashMap<String, TokenBucket>, max_age: Duration) {
    let now = Instant::now();
    buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
}

/// Middleware function; wire with `middleware::from_fn_with_state`
pub async fn rate_limit(
    axum::extract::State(limiter): axum::extract::State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_key = client_ip(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.check(&client_key).await {
        tracing::warn!(client = %client_key, "Rate limit exceeded");
        let body = ErrorResponse {
            success: false,
            message: "Too many requests. Please try again later.".to_string(),
            code: "TOO_MANY_REQUESTS",
        };
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "1")],
            Json(body),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_reject() {
        let limiter = RateLimiter::new(5);

        // Burst capacity is 2x the sustained rate
        for _ in 0..10 {
            assert!(limiter.check("10.0.0.1").await);
        }
        assert!(!limiter.check("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_clients_have_separate_buckets() {
        let limiter = RateLimiter::new(1);

        assert!(limiter.check("client-a").await);
        assert!(limiter.check("client-a").await);
        assert!(!limiter.check("client-a").await);
        assert!(limiter.check("client-b").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_buckets() {
        let limiter = RateLimiter::new(1);
        limiter.check("client-a").await;
        assert_eq!(limiter.tracked_clients().await, 1);

        limiter.cleanup(Duration::ZERO).await;
        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[tokio::test]
    async fn test_background_sweep_evicts_idle_clients() {
        let limiter = RateLimiter::new(1);
        limiter.check("client-a").await;

        let sweeper = limiter.spawn_cleanup(Duration::from_millis(10), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert_eq!(limiter.tracked_clients().await, 0);
    }
}
