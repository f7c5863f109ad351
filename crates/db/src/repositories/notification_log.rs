//! Outbound message log.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::info;

use khata_core::notification::{DeliveryStatus, WhatsAppMessage};

use crate::entities::whatsapp_logs;

use super::RepositoryError;

/// Writes `whatsapp_logs` rows.
///
/// The log table is not org-scoped, so writes go through the plain pool.
#[derive(Debug, Clone)]
pub struct NotificationLogRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationLogRepository {
    /// Creates a new notification log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records a message as handed off at `sent_at`.
    ///
    /// # Errors
    ///
    /// Returns a domain error for a blank phone or body, or an error if the
    /// insert fails.
    pub async fn record(
        &self,
        message: &WhatsAppMessage,
        sent_at: DateTime<Utc>,
    ) -> Result<whatsapp_logs::Model, RepositoryError> {
        message.validate()?;

        let row = whatsapp_logs::ActiveModel {
            phone: Set(message.phone.trim().to_string()),
            message: Set(message.message.clone()),
            bill_id: Set(message.bill_id.clone()),
            status: Set(DeliveryStatus::Sent.as_str().to_string()),
            sent_at: Set(sent_at.fixed_offset()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(
            phone = %row.phone,
            bill_id = ?row.bill_id,
            "WhatsApp message logged"
        );
        Ok(row)
    }
}
