use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::session::CancelledBy;

/// A lifecycle event handed to the notification collaborator after the
/// owning transaction has committed.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Booked {
        session_id: Uuid,
        client_id: Uuid,
        coach_id: Uuid,
    },
    Cancelled {
        session_id: Uuid,
        cancelled_by: CancelledBy,
    },
    Rescheduled {
        session_id: Uuid,
    },
    Completed {
        session_id: Uuid,
        coach_id: Uuid,
    },
}

/// Best-effort dispatcher for session events.
///
/// Publishing never blocks and never fails the operation that produced the
/// event; the worker drains the queue on its own task. Webhook and email
/// fan-out live behind this boundary, outside the core.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Notifier {
    /// Spawns the dispatch worker and returns a handle for publishing.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                dispatch(event);
            }
            tracing::debug!("Notification dispatcher stopped");
        });
        Self { tx }
    }

    /// Hands an event to the dispatcher. Dropped (with a warning) if the
    /// worker is gone; the lifecycle operation already committed.
    pub fn publish(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Notification dispatcher unavailable, event dropped");
        }
    }
}

fn dispatch(event: SessionEvent) {
    match event {
        SessionEvent::Booked {
            session_id,
            client_id,
            coach_id,
        } => {
            tracing::info!(
                %session_id, %client_id, %coach_id,
                "Dispatching booking notification"
            );
        }
        SessionEvent::Cancelled {
            session_id,
            cancelled_by,
        } => {
            tracing::info!(
                %session_id, cancelled_by = cancelled_by.as_str(),
                "Dispatching cancellation notification"
            );
        }
        SessionEvent::Rescheduled { session_id } => {
            tracing::info!(%session_id, "Dispatching reschedule notification");
        }
        SessionEvent::Completed {
            session_id,
            coach_id,
        } => {
            tracing::info!(%session_id, %coach_id, "Dispatching completion notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_is_fire_and_forget() {
        let notifier = Notifier::spawn();
        notifier.publish(SessionEvent::Rescheduled {
            session_id: Uuid::new_v4(),
        });
        // Publishing must not error or block even if nothing reads promptly.
        notifier.publish(SessionEvent::Booked {
            session_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            coach_id: Uuid::new_v4(),
        });
    }
}
