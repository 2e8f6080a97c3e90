//! Outbound notifications. Handlers enqueue an event after the originating
//! write has committed; a detached dispatcher owns the transport. Transport
//! failures are logged, never surfaced to the request path.

pub mod transport;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use transport::MailTransport;

/// One event per workflow step; each knows its recipient and wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Registration { to: String, name: String },
    SpacePosted { to: String, name: String },
    AvailabilityUpdated { to: String, name: String },
    BookingRequested { to: String, name: String },
    RequestReceived { to: String },
    BookingConfirmed { to: String, name: String },
    BookingApproved { to: String },
    BookingDenied { to: String },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::Registration { to, .. }
            | Notification::SpacePosted { to, .. }
            | Notification::AvailabilityUpdated { to, .. }
            | Notification::BookingRequested { to, .. }
            | Notification::RequestReceived { to }
            | Notification::BookingConfirmed { to, .. }
            | Notification::BookingApproved { to }
            | Notification::BookingDenied { to } => to,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::Registration { .. } => "Welcome to BnB!",
            Notification::SpacePosted { .. } => "Your space has been posted!",
            Notification::AvailabilityUpdated { .. } => "Your space has been updated!",
            Notification::BookingRequested { .. } => "You have a new booking request!",
            Notification::RequestReceived { .. } => "You've requested a booking!",
            Notification::BookingConfirmed { .. } => "You've confirmed a booking!",
            Notification::BookingApproved { .. } => "Your request has been approved!",
            Notification::BookingDenied { .. } => "Your request has been denied!",
        }
    }

    pub fn body(&self) -> String {
        const SIGNOFF: &str = "\n\nBest regards,\nBnB Team";
        match self {
            Notification::Registration { name, .. } => {
                format!("Hello, {name}\nThank you for signing up to BnB!{SIGNOFF}")
            }
            Notification::SpacePosted { name, .. } => format!(
                "Hello, {name}\nThank you for posting your space!\nPlease add availability so others can request a booking.{SIGNOFF}"
            ),
            Notification::AvailabilityUpdated { name, .. } => format!(
                "Hello, {name}\nYour space has been successfully updated and the changes are visible to other users.{SIGNOFF}"
            ),
            Notification::BookingRequested { name, .. } => format!(
                "Hello, {name}\nSomeone has just submitted a request to book your space.\nPlease visit your profile to approve it.{SIGNOFF}"
            ),
            Notification::RequestReceived { .. } => format!(
                "Hello!\nYou've just requested a booking.\nYou'll be informed in a separate email once your request is approved.{SIGNOFF}"
            ),
            Notification::BookingConfirmed { name, .. } => {
                format!("Hello, {name}\nYou've just confirmed booking of your space.{SIGNOFF}")
            }
            Notification::BookingApproved { .. } => {
                format!("Hello!\nYour request to book a space has been approved.{SIGNOFF}")
            }
            Notification::BookingDenied { .. } => {
                format!("Hello!\nYour request to book a space has been denied.{SIGNOFF}")
            }
        }
    }
}

/// Cheap-to-clone handle; enqueues and returns immediately.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire and forget. A closed dispatcher only costs a warning.
    pub fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("notification dropped: dispatcher is gone");
        }
    }
}

/// Drains the queue until every sender is dropped. Transport errors are
/// logged and the loop keeps going.
pub fn spawn_dispatcher(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    transport: Arc<dyn MailTransport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(n) = rx.recv().await {
            let (to, subject) = (n.recipient().to_string(), n.subject());
            match transport.send(&to, subject, &n.body()).await {
                Ok(()) => debug!(%to, subject, "notification sent"),
                Err(e) => warn!(%to, subject, error = %e, "notification failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::transport::TransportError;
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((to.into(), subject.into()));
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait::async_trait]
    impl MailTransport for FailingTransport {
        async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), TransportError> {
            Err(TransportError("smtp relay on fire".into()))
        }
    }

    #[tokio::test]
    async fn dispatcher_drains_events_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let (notifier, rx) = Notifier::new();
        let handle = spawn_dispatcher(rx, transport.clone());

        notifier.notify(Notification::Registration { to: "a@x.com".into(), name: "A".into() });
        notifier.notify(Notification::BookingApproved { to: "b@x.com".into() });
        drop(notifier);
        handle.await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], ("a@x.com".into(), "Welcome to BnB!".into()));
        assert_eq!(sent[1], ("b@x.com".into(), "Your request has been approved!".into()));
    }

    #[tokio::test]
    async fn transport_failure_never_reaches_the_caller() {
        let (notifier, rx) = Notifier::new();
        let handle = spawn_dispatcher(rx, Arc::new(FailingTransport));

        // neither call may error or panic
        notifier.notify(Notification::BookingDenied { to: "c@x.com".into() });
        notifier.notify(Notification::RequestReceived { to: "c@x.com".into() });
        drop(notifier);
        handle.await.unwrap();
    }

    #[test]
    fn notify_after_dispatcher_shutdown_is_a_noop() {
        let (notifier, rx) = Notifier::new();
        drop(rx);
        notifier.notify(Notification::BookingApproved { to: "d@x.com".into() });
    }

    #[test]
    fn bodies_greet_the_recipient_by_name() {
        let n = Notification::SpacePosted { to: "o@x.com".into(), name: "Olive".into() };
        assert!(n.body().starts_with("Hello, Olive\n"));
        assert_eq!(n.recipient(), "o@x.com");
    }
}
