//! # Event Bus System
//!
//! Broadcasts authentication state changes to the host using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **AuthEvent**: what happened to the Crowdin session
//! - **EventBus**: broadcast channel the client publishes on
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! Publishing never fails the operation that triggered it: with no
//! subscribers, `emit` returns an error the caller simply ignores.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(16);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.emit(AuthEvent::SignedIn).ok();
//! assert_eq!(subscriber.recv().await.unwrap(), AuthEvent::SignedIn);
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events and can keep
//!   receiving.
//! - **`RecvError::Closed`**: the client was dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 32;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Session lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// The authorization page was opened and a callback is awaited.
    SigningIn,
    /// A token was obtained and stored.
    SignedIn,
    /// The user signed out; the stored token was removed.
    SignedOut,
    /// The server rejected the stored token; the user must sign in again.
    SessionExpired {
        /// Operation that observed the rejection.
        operation: String,
    },
    /// The sign-in attempt failed.
    AuthError {
        /// Human-readable error message.
        message: String,
        /// Whether retrying the sign-in may succeed.
        recoverable: bool,
    },
}

impl AuthEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            AuthEvent::SigningIn => "Authentication in progress",
            AuthEvent::SignedIn => "Signed in to Crowdin",
            AuthEvent::SignedOut => "Signed out of Crowdin",
            AuthEvent::SessionExpired { .. } => "Crowdin session expired",
            AuthEvent::AuthError { .. } => "Authentication failed",
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            AuthEvent::AuthError { .. } => EventSeverity::Error,
            AuthEvent::SessionExpired { .. } => EventSeverity::Warning,
            AuthEvent::SignedIn | AuthEvent::SignedOut => EventSeverity::Info,
            AuthEvent::SigningIn => EventSeverity::Debug,
        }
    }
}

/// Central broadcast channel for auth events.
///
/// Cloning is cheap and every clone publishes on the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl EventBus {
    /// Creates a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when nobody is listening.
    pub fn emit(&self, event: AuthEvent) -> Result<usize, SendError<AuthEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&AuthEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{AuthEvent, EventBus, EventSeverity, EventStream};
///
/// let event_bus = EventBus::new(16);
/// let errors_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<AuthEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<AuthEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&AuthEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &AuthEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<AuthEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<AuthEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(AuthEvent::SignedOut).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = AuthEvent::SessionExpired {
            operation: "fetch projects".to_string(),
        };
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| event.severity() >= EventSeverity::Warning);

        bus.emit(AuthEvent::SigningIn).ok();
        bus.emit(AuthEvent::SignedIn).ok();
        bus.emit(AuthEvent::AuthError {
            message: "denied".to_string(),
            recoverable: true,
        })
        .ok();

        let received = stream.recv().await.unwrap();
        assert!(matches!(received, AuthEvent::AuthError { .. }));
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for _ in 0..5 {
            bus.emit(AuthEvent::SigningIn).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_closed_after_bus_dropped() {
        let bus = EventBus::new(2);
        let mut stream = EventStream::new(bus.subscribe());
        drop(bus);

        assert!(matches!(stream.recv().await, Err(RecvError::Closed)));
    }

    #[test]
    fn test_event_serialization() {
        let event = AuthEvent::SessionExpired {
            operation: "upload".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "SessionExpired");
        assert_eq!(json["operation"], "upload");

        let json = serde_json::to_string(&AuthEvent::SignedIn).unwrap();
        assert_eq!(json, r#"{"event":"SignedIn"}"#);
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(AuthEvent::SigningIn.severity(), EventSeverity::Debug);
        assert_eq!(AuthEvent::SignedOut.severity(), EventSeverity::Info);
        assert_eq!(
            AuthEvent::AuthError {
                message: String::new(),
                recoverable: false
            }
            .severity(),
            EventSeverity::Error
        );
        assert_eq!(AuthEvent::SignedIn.description(), "Signed in to Crowdin");
    }
}
