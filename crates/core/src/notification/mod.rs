//! Outbound WhatsApp messages.
//!
//! No provider is wired up yet: a request is validated, logged, and recorded
//! with status `sent`, and the caller receives a placeholder message id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Request to message a farmer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppMessage {
    /// Destination phone number.
    pub phone: String,
    /// Message body.
    pub message: String,
    /// Bill the message refers to.
    #[serde(default)]
    pub bill_id: Option<String>,
}

impl WhatsAppMessage {
    /// Rejects blank phone numbers and bodies.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Required` for a blank phone or message.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.phone.trim().is_empty() {
            return Err(DomainError::Required { field: "phone" });
        }
        if self.message.trim().is_empty() {
            return Err(DomainError::Required { field: "message" });
        }
        Ok(())
    }
}

/// Delivery status recorded in the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Handed off (currently: logged only).
    Sent,
}

impl DeliveryStatus {
    /// Value of the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
        }
    }
}

/// Response body of the send-message function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReceipt {
    /// Always true; failures are reported as errors.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// Placeholder id, `msg_{unix_millis}`.
    pub message_id: String,
}

impl MessageReceipt {
    /// Receipt for a message queued at `now`.
    #[must_use]
    pub fn queued(now: DateTime<Utc>) -> Self {
        Self {
            success: true,
            message: "WhatsApp message queued successfully".to_string(),
            message_id: format!("msg_{}", now.timestamp_millis()),
        }
    }
}
