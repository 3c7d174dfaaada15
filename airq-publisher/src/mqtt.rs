// AirQ Publisher - MQTT transport
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! MQTT transport backed by rumqttc.
//!
//! Publishes are queued on the client without waiting (QoS 0, not
//! retained). A background task drives the event loop, which owns the
//! socket and reconnects after mid-run drops.

use crate::config::PublisherConfig;
use crate::error::{PublisherError, Result};
use airq_sim::{Transport, TransportError, TransportMetrics};
use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Capacity of the client request queue.
const REQUEST_QUEUE_CAPACITY: usize = 32;

/// How long startup waits for the broker's CONNACK.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between event-loop polls after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Transport publishing readings to an MQTT broker.
pub struct MqttTransport {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    metrics: TransportMetrics,
    event_task: Option<JoinHandle<()>>,
}

impl MqttTransport {
    /// Connect to the configured broker.
    ///
    /// Returns once the broker has acknowledged the session. Any error
    /// before that is returned to the caller, which treats it as fatal.
    pub async fn connect(config: &PublisherConfig) -> Result<Self> {
        let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_QUEUE_CAPACITY);
        let broker = config.broker();

        match timeout(CONNECT_TIMEOUT, wait_for_connack(&mut eventloop)).await {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => return Err(PublisherError::Connect { broker, reason }),
            Err(_) => {
                return Err(PublisherError::Connect {
                    broker,
                    reason: format!("no CONNACK within {:?}", CONNECT_TIMEOUT),
                })
            }
        }
        info!("Connected to MQTT broker at {}", broker);

        let connected = Arc::new(AtomicBool::new(true));
        let event_task = tokio::spawn(drive_event_loop(eventloop, Arc::clone(&connected)));

        Ok(Self {
            client,
            connected,
            metrics: TransportMetrics::default(),
            event_task: Some(event_task),
        })
    }

    /// Disconnect and wait for the event loop to flush the DISCONNECT packet.
    ///
    /// Returns the totals of what was handed to the client over the session.
    pub async fn shutdown(mut self, grace: Duration) -> TransportMetrics {
        self.close();
        if let Some(task) = self.event_task.take() {
            if timeout(grace, task).await.is_err() {
                warn!("MQTT event loop did not stop within {:?}", grace);
            }
        }
        self.metrics
    }
}

impl Transport for MqttTransport {
    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> airq_sim::Result<()> {
        let size = payload.len() as u64;
        match self
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
        {
            Ok(()) => {
                self.metrics.messages_sent += 1;
                self.metrics.bytes_sent += size;
                Ok(())
            }
            Err(e) => {
                self.metrics.messages_failed += 1;
                Err(map_client_error(e, self.is_connected()).into())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn metrics(&self) -> TransportMetrics {
        self.metrics.clone()
    }

    fn close(&mut self) {
        if let Err(e) = self.client.try_disconnect() {
            debug!("Disconnect request not queued: {}", e);
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

fn map_client_error(error: ClientError, connected: bool) -> TransportError {
    if !connected {
        TransportError::Disconnected {
            reason: error.to_string(),
        }
    } else {
        match error {
            ClientError::TryRequest(_) => TransportError::BufferFull,
            other => TransportError::Rejected {
                reason: other.to_string(),
            },
        }
    }
}

/// Poll until the broker acknowledges the connection.
async fn wait_for_connack(eventloop: &mut EventLoop) -> std::result::Result<(), String> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
            Ok(event) => debug!("Event before CONNACK: {:?}", event),
            Err(e) => return Err(e.to_string()),
        }
    }
}

/// Drive the event loop until a DISCONNECT goes out.
async fn drive_event_loop(mut eventloop: EventLoop, connected: Arc<AtomicBool>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Reconnected to MQTT broker");
                connected.store(true, Ordering::SeqCst);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("DISCONNECT sent, stopping event loop");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                if connected.swap(false, Ordering::SeqCst) {
                    warn!("MQTT connection lost: {}", e);
                }
                sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_error() {
        // Nothing listens on this port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = PublisherConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };

        let result = MqttTransport::connect(&config).await;
        assert!(matches!(result, Err(PublisherError::Connect { .. })));
    }

    fn unpolled_transport(capacity: usize) -> (MqttTransport, EventLoop) {
        let options = MqttOptions::new("airq-test", "127.0.0.1", 1883);
        let (client, eventloop) = AsyncClient::new(options, capacity);
        let transport = MqttTransport {
            client,
            connected: Arc::new(AtomicBool::new(true)),
            metrics: TransportMetrics::default(),
            event_task: None,
        };
        (transport, eventloop)
    }

    #[test]
    fn test_full_queue_is_buffer_full() {
        // The event loop is never polled, so the queue only fills up.
        let (mut transport, _eventloop) = unpolled_transport(1);

        transport.publish("AirQuality/co2", b"{}".to_vec()).unwrap();
        let result = transport.publish("AirQuality/co2", b"{}".to_vec());

        assert!(matches!(
            result,
            Err(airq_sim::SimError::Transport(TransportError::BufferFull))
        ));
        let metrics = transport.metrics();
        assert_eq!(metrics.messages_sent, 1);
        assert_eq!(metrics.messages_failed, 1);
    }

    #[tokio::test]
    async fn test_shutdown_returns_session_totals() {
        let (mut transport, _eventloop) = unpolled_transport(4);
        transport.publish("AirQuality/co2", b"{\"value\":1}".to_vec()).unwrap();
        transport.publish("AirQuality/pm25", b"{}".to_vec()).unwrap();

        let totals = transport.shutdown(Duration::from_millis(10)).await;
        assert_eq!(totals.messages_sent, 2);
        assert_eq!(totals.bytes_sent, 13);
        assert_eq!(totals.messages_failed, 0);
    }

    #[test]
    fn test_publish_after_close_is_disconnected() {
        let (mut transport, eventloop) = unpolled_transport(4);
        drop(eventloop);
        transport.close();
        assert!(!transport.is_connected());

        let result = transport.publish("AirQuality/hum", b"{}".to_vec());
        assert!(matches!(
            result,
            Err(airq_sim::SimError::Transport(TransportError::Disconnected { .. }))
        ));
    }
}
