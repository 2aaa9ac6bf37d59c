//! Order lookup example guarded by a circuit breaker.
//!
//! This example shows how to:
//! - Wrap an async closure as a protected call
//! - Configure the error threshold and timeouts
//! - Serve a fixed fallback while the circuit is open
//! - Observe transitions and map results to HTTP-style statuses
//!
//! Run with: cargo run --example order_lookup

use breakwater::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
#[error("order service returned an error for user {user_id}")]
struct OrderServiceError {
    user_id: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; transitions are logged on the `breakwater::events` target
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,breakwater=debug")),
        )
        .init();

    println!("=== Order Lookup Example ===\n");

    // A flaky order service: about 60% of requests fail, every third one is slow
    let requests = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&requests);
    let lookup = FnCall::new("orders", move |user_id: u64| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            let latency = if n % 3 == 2 { 400 } else { 50 };
            tokio::time::sleep(Duration::from_millis(latency)).await;

            if (n as f64 * 0.618_034) % 1.0 < 0.6 {
                Err(OrderServiceError { user_id })
            } else {
                Ok(vec![format!("order-{user_id}-{n}")])
            }
        }
    });

    let config = CircuitBreakerConfig::default()
        .with_call_timeout(Duration::from_millis(300))
        .with_error_threshold_percentage(50.0)
        .with_minimum_samples(4)
        .with_reset_timeout(Duration::from_secs(2));

    println!("Circuit Breaker Configuration:");
    println!("  Call timeout: {:?}", config.call_timeout);
    println!("  Error threshold: {}%", config.error_threshold_percentage);
    println!("  Minimum samples: {}", config.minimum_samples);
    println!("  Reset timeout: {:?}", config.reset_timeout);
    println!();

    let breaker = CircuitBreaker::try_new(lookup, config)?
        .with_fallback(fallback::fixed(Vec::<String>::new()));

    breaker.on_any_transition(|event| {
        println!(
            "  >> circuit '{}' {} ({} -> {}) at {:.0}% errors",
            event.breaker, event.kind, event.from, event.to, event.error_rate
        );
    });

    for i in 1..=20u64 {
        let user_id = 1000 + i;
        let state = breaker.circuit_state();

        let (status, body) = match breaker.execute(user_id).await {
            Ok(orders) if orders.is_empty() => (200, "no orders".to_string()),
            Ok(orders) => (200, orders.join(", ")),
            Err(e) if e.is_denied() => (503, e.to_string()),
            Err(e) if e.is_timeout() => (504, e.to_string()),
            Err(e) => (500, e.to_string()),
        };

        println!("Request #{i:>2} [{state}]: {status} {body}");

        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    let metrics = breaker.metrics();
    println!("\nFinal Metrics:");
    println!("  Total calls: {}", metrics.total_calls);
    println!("  Successful: {}", metrics.successful_calls);
    println!("  Failed: {}", metrics.failed_calls);
    println!("  Timed out: {}", metrics.timed_out_calls);
    println!("  Rejected: {}", metrics.rejected_calls);
    println!("  Fallbacks: {}", metrics.fallbacks);
    println!("  Times opened: {}", metrics.times_opened);
    println!("  Downstream requests: {}", requests.load(Ordering::SeqCst));

    println!("\n=== Example Complete ===");

    Ok(())
}
