//! Change log for attendance edits.

use async_trait::async_trait;
use db::models::audit_log::Model as AuditLog;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub entity_type: &'static str,
    pub entity_id: i64,
    pub action: &'static str,
    pub actor: String,
    /// `{"field": {"from": .., "to": ..}}`
    pub diff: Value,
}

#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn record(&self, entry: AuditEntry) -> Result<(), AppError>;
}

/// Writes entries to the `audit_logs` table.
#[derive(Clone)]
pub struct DbAuditSink {
    db: DatabaseConnection,
}

impl DbAuditSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AppError> {
        AuditLog::create(
            &self.db,
            entry.entity_type,
            entry.entity_id,
            entry.action,
            &entry.actor,
            entry.diff,
        )
        .await?;
        Ok(())
    }
}
