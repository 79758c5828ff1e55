//! In-process fan-out of gateway events.
//!
//! Every open stream holds a receiver of one broadcast channel. A slow
//! stream that falls more than the channel capacity behind loses the oldest
//! events; the portal tolerates that because every event triggers a refetch.

use ashva_realtime_core::event::GatewayEvent;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default number of buffered events per subscriber.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Broadcasts events to every connected stream.
///
/// Cloning yields another handle to the same channel.
///
/// # Example
///
/// ```
/// use ashva_realtime_gateway::EventHub;
///
/// let hub = EventHub::default();
/// let mut rx = hub.subscribe();
///
/// assert!(hub.publish_mutation("tickets", "PATCH", "/api/v1/tickets/7", 200, None));
/// assert_eq!(rx.try_recv().unwrap().kind.as_deref(), Some("tickets.changed"));
/// ```
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventHub {
    /// Create a hub buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send an event to every current subscriber.
    ///
    /// Returns how many subscribers received it; zero is not an error.
    pub fn publish(&self, event: GatewayEvent) -> usize {
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(delivered, "Published event");
        metrics::counter!("gateway_events_published_total").increment(1);
        delivered
    }

    /// Announce a proxied write if it qualifies as a mutation.
    ///
    /// Returns whether an event was published.
    pub fn publish_mutation(
        &self,
        service: &str,
        method: &str,
        path: &str,
        status_code: u16,
        data: Option<serde_json::Value>,
    ) -> bool {
        let Some(mut event) = GatewayEvent::mutation(service, method, path, status_code, Utc::now())
        else {
            trace!(service, method, status_code, "Write does not qualify for an event");
            return false;
        };
        if let Some(data) = data {
            event = event.with_data(data);
        }

        debug!(event_type = ?event.kind, path, "Publishing mutation event");
        self.publish(event);
        true
    }

    /// Receive every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers() {
        let hub = EventHub::default();
        assert_eq!(hub.publish(GatewayEvent::default()), 0);
    }

    #[test]
    fn test_fan_out() {
        let hub = EventHub::default();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        let event = GatewayEvent {
            service: Some("tickets".to_string()),
            ..GatewayEvent::default()
        };
        assert_eq!(hub.publish(event.clone()), 2);
        assert_eq!(a.try_recv().unwrap(), event);
        assert_eq!(b.try_recv().unwrap(), event);

        drop(a);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn test_mutation_filtering() {
        let hub = EventHub::default();
        let mut rx = hub.subscribe();

        assert!(!hub.publish_mutation("tickets", "GET", "/api/v1/tickets", 200, None));
        assert!(!hub.publish_mutation("tickets", "POST", "/api/v1/tickets", 422, None));
        assert!(!hub.publish_mutation("payments", "POST", "/api/v1/payments", 201, None));
        assert!(rx.try_recv().is_err());

        assert!(hub.publish_mutation(
            "assignments",
            "delete",
            "/api/v1/assignments/3",
            204,
            Some(json!({"id": 3})),
        ));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind.as_deref(), Some("assignments.changed"));
        assert_eq!(event.method.as_deref(), Some("DELETE"));
        assert_eq!(event.data, Some(json!({"id": 3})));
    }

    #[test]
    fn test_lagged_subscriber_skips_oldest() {
        let hub = EventHub::new(2);
        let mut rx = hub.subscribe();

        for service in ["a", "b", "c"] {
            hub.publish(GatewayEvent {
                service: Some(service.to_string()),
                ..GatewayEvent::default()
            });
        }

        assert!(matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Lagged(1))));
        assert_eq!(rx.try_recv().unwrap().service.as_deref(), Some("b"));
    }
}
