//! Outbound quote notification seam.
//!
//! The pipeline's terminal stage hands an [`EmailMessage`] to a [`Notifier`]
//! and moves on. Implementations must return without waiting for delivery:
//! the guarantee is at-most-once, best effort, with no confirmation reported
//! back into the pricing state.

use serde::{Deserialize, Serialize};

/// A plain-text message addressed to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient addresses
    pub to: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

impl EmailMessage {
    /// Compose the quote notification for a completed request.
    ///
    /// # Examples
    /// ```
    /// use delivery_core::notify::EmailMessage;
    ///
    /// let msg = EmailMessage::quote("a@example.com", "D-1A2B3C4D", "user-7", 300.0);
    /// assert_eq!(msg.to, vec!["a@example.com".to_string()]);
    /// assert!(msg.subject.contains("D-1A2B3C4D"));
    /// assert!(msg.body.contains("$300.00"));
    /// ```
    pub fn quote(email: &str, ticket_id: &str, user_id: &str, total_price: f64) -> Self {
        Self {
            to: vec![email.to_string()],
            subject: format!("Delivery quote {}", ticket_id),
            body: format!(
                "Hello {user},\n\n\
                 Your delivery request {ticket} has been priced.\n\
                 Total price: ${total:.2}\n\n\
                 Keep the ticket id for future reference.\n",
                user = user_id,
                ticket = ticket_id,
                total = total_price,
            ),
        }
    }
}

/// Fire-and-forget dispatcher for quote notifications.
pub trait Notifier: Send + Sync {
    /// Hand off `message` for delivery without blocking the caller.
    ///
    /// Failures are the implementation's concern and are never reported back.
    fn dispatch(&self, message: EmailMessage);
}

/// Notifier that drops every message.
///
/// Used where no transport exists, such as offline CLI quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn dispatch(&self, message: EmailMessage) {
        tracing::debug!(to = ?message.to, subject = %message.subject, "notification dropped");
    }
}
