// AirQ Publisher - Tick loop
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Simulation loop: tick, publish the four readings with pacing, wait.
//!
//! Each tick completes fully before the next one starts. A shutdown signal
//! interrupts any delay, after which the caller releases the transport.

use crate::metrics::{record_publish, record_tick};
use airq_sim::{RetryStrategy, Simulator, Tick, Transport};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Loop settings derived from the publisher configuration.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Topic prefix.
    pub topic_prefix: String,
    /// Delay between ticks.
    pub tick_interval: Duration,
    /// Delay after each published reading.
    pub publish_pacing: Duration,
    /// Retry policy for failed publishes.
    pub retry: RetryStrategy,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
}

/// Delivery outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Messages accepted by the transport.
    pub published: usize,
    /// Messages dropped after exhausting retries.
    pub failed: usize,
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks completed.
    pub ticks: u64,
    /// Messages accepted by the transport.
    pub published: usize,
    /// Messages dropped.
    pub failed: usize,
}

/// Resolve once shutdown has been requested (or the sender is gone).
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Publish one payload, retrying according to `retry`.
///
/// Returns the number of attempts made on success.
pub async fn publish_with_retry<T: Transport>(
    transport: &mut T,
    topic: &str,
    payload: Vec<u8>,
    retry: &RetryStrategy,
) -> airq_sim::Result<u32> {
    let mut attempt = 0;
    loop {
        match transport.publish(topic, payload.clone()) {
            Ok(()) => return Ok(attempt + 1),
            Err(e) => match retry.delay_for_attempt(attempt) {
                Some(delay) => {
                    debug!("Publish to {} failed ({}), retrying in {:?}", topic, e, delay);
                    sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(e),
            },
        }
    }
}

/// Publish every reading of a tick, pausing `publish_pacing` after each.
///
/// A reading that cannot be delivered is logged and counted; the remaining
/// readings of the tick are still sent.
pub async fn emit_tick<T: Transport>(
    transport: &mut T,
    tick: &Tick,
    settings: &LoopSettings,
) -> PublishReport {
    let mut report = PublishReport::default();

    for out in tick.readings(&settings.topic_prefix) {
        let delivered = match out.reading.to_json() {
            Ok(payload) => {
                match publish_with_retry(transport, &out.topic, payload, &settings.retry).await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("Dropped {} reading on {}: {}", out.kind, out.topic, e);
                        false
                    }
                }
            }
            Err(e) => {
                warn!("Could not encode {} reading: {}", out.kind, e);
                false
            }
        };

        record_publish(out.kind, delivered);
        if delivered {
            report.published += 1;
            info!(
                "   {:<5} : {} {}",
                out.kind.key().to_uppercase(),
                out.reading.value,
                out.kind.unit()
            );
        } else {
            report.failed += 1;
        }

        if !settings.publish_pacing.is_zero() {
            sleep(settings.publish_pacing).await;
        }
    }

    report
}

/// Run the simulation loop until shutdown or `max_ticks`.
pub async fn run<T: Transport>(
    sim: &mut Simulator,
    transport: &mut T,
    settings: &LoopSettings,
    mut shutdown: watch::Receiver<bool>,
) -> RunSummary {
    let mut summary = RunSummary::default();
    info!(
        "Simulation running: tick every {:?}, topics {}/<sensor>",
        settings.tick_interval, settings.topic_prefix
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        let tick = sim.tick();
        record_tick(&tick);
        info!(
            "Tick {} [{}]: {}",
            tick.cycle_position,
            tick.scenario,
            tick.status()
        );

        let report = tokio::select! {
            report = emit_tick(transport, &tick, settings) => report,
            _ = wait_for_shutdown(&mut shutdown) => break,
        };
        summary.ticks += 1;
        summary.published += report.published;
        summary.failed += report.failed;

        if settings.max_ticks.is_some_and(|max| summary.ticks >= max) {
            info!("Reached {} ticks, stopping", summary.ticks);
            break;
        }

        tokio::select! {
            _ = sleep(settings.tick_interval) => {}
            _ = wait_for_shutdown(&mut shutdown) => break,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use airq_sim::{MemoryTransport, SensorReading};

    fn fast_settings() -> LoopSettings {
        LoopSettings {
            topic_prefix: "AirQuality".to_string(),
            tick_interval: Duration::from_millis(1),
            publish_pacing: Duration::ZERO,
            retry: RetryStrategy::None,
            max_ticks: None,
        }
    }

    #[tokio::test]
    async fn test_emit_tick_publishes_four_messages() {
        let mut sim = Simulator::seeded(1);
        let mut transport = MemoryTransport::new();
        let tick = sim.tick_at(1_700_000_000.0);

        let report = emit_tick(&mut transport, &tick, &fast_settings()).await;
        assert_eq!(report, PublishReport { published: 4, failed: 0 });

        let messages = transport.drain();
        let topics: Vec<_> = messages.iter().map(|m| m.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec!["AirQuality/co2", "AirQuality/pm25", "AirQuality/temp", "AirQuality/hum"]
        );
        for msg in &messages {
            let reading = SensorReading::from_json(&msg.payload).unwrap();
            assert_eq!(reading.timestamp, 1_700_000_000.0);
        }
    }

    #[tokio::test]
    async fn test_failed_reading_does_not_abort_tick() {
        let mut sim = Simulator::seeded(2);
        let mut transport = MemoryTransport::new();
        transport.fail_next(1);
        let tick = sim.tick_at(0.0);

        let report = emit_tick(&mut transport, &tick, &fast_settings()).await;
        assert_eq!(report, PublishReport { published: 3, failed: 1 });
        assert_eq!(transport.pop().unwrap().topic, "AirQuality/pm25");
    }

    #[tokio::test]
    async fn test_retry_recovers_failed_publish() {
        let mut transport = MemoryTransport::new();
        transport.fail_next(2);
        let retry = RetryStrategy::fixed(3, Duration::from_millis(1));

        let attempts = publish_with_retry(&mut transport, "t", vec![1], &retry)
            .await
            .unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(transport.pending(), 1);
    }

    #[tokio::test]
    async fn test_retry_exhausted_returns_error() {
        let mut transport = MemoryTransport::new();
        transport.fail_next(5);
        let retry = RetryStrategy::fixed(2, Duration::from_millis(1));

        let result = publish_with_retry(&mut transport, "t", vec![1], &retry).await;
        assert!(result.is_err());
        assert_eq!(transport.metrics().messages_failed, 3);
    }

    #[tokio::test]
    async fn test_run_stops_after_max_ticks() {
        let mut sim = Simulator::seeded(3);
        let mut transport = MemoryTransport::new();
        let (_tx, rx) = watch::channel(false);
        let settings = LoopSettings {
            max_ticks: Some(5),
            ..fast_settings()
        };

        let summary = run(&mut sim, &mut transport, &settings, rx).await;
        assert_eq!(summary, RunSummary { ticks: 5, published: 20, failed: 0 });
        assert_eq!(sim.position(), 5);
        assert_eq!(transport.pending(), 20);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut sim = Simulator::seeded(4);
        let mut transport = MemoryTransport::new();
        let (tx, rx) = watch::channel(false);
        let settings = LoopSettings {
            tick_interval: Duration::from_secs(3600),
            ..fast_settings()
        };

        let stopper = tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            tx.send(true).ok();
        });

        let summary = run(&mut sim, &mut transport, &settings, rx).await;
        stopper.await.unwrap();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.published, 4);
    }

    #[tokio::test]
    async fn test_run_with_shutdown_already_requested() {
        let mut sim = Simulator::seeded(5);
        let mut transport = MemoryTransport::new();
        let (_tx, rx) = watch::channel(true);

        let summary = run(&mut sim, &mut transport, &fast_settings(), rx).await;
        assert_eq!(summary, RunSummary::default());
        assert_eq!(sim.position(), 0);
    }
}
