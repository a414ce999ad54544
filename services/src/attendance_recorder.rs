//! The only writer of attendance records.
//!
//! Redemptions, bulk marks and single-record edits all land here, and every
//! successful write is pushed to the session's live watchers through the
//! broker. Broker delivery never fails a write.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use db::models::attendance_record::{
    AttendanceStatus, Entity as RecordEntity, Model as AttendanceRecord, NewRecord, RecordSource,
};
use db::models::check_in_token::Entity as TokenEntity;
use db::models::session::{CheckInMode, Entity as SessionEntity, Model as Session};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, TransactionTrait};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use util::config;
use util::state::AppState;
use util::ws::SubscriptionBroker;
use util::ws::event::{AttendanceUpdated, LiveEvent, SessionDeleted, SessionStats};
use validator::{Validate, ValidationError};

use crate::audit::{AuditEntry, AuditSink, DbAuditSink};
use crate::error::{AppError, require_non_blank};
use crate::roster::{DbRoster, Roster};
use crate::token_issuer::TokenIssuer;

/// Location reported by the scanning device. Stored, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(
        range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"),
        custom(function = "finite")
    )]
    pub lat: f64,

    #[validate(
        range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"),
        custom(function = "finite")
    )]
    pub long: f64,

    #[validate(
        range(min = 0.0, message = "Accuracy must not be negative"),
        custom(function = "finite")
    )]
    pub accuracy: Option<f64>,
}

fn finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite").with_message("Coordinates must be finite numbers".into()))
    }
}

/// One line of a bulk mark. `status` falls back to the request default.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkEntry {
    #[validate(length(min = 1, max = 128, message = "Student id must be 1-128 characters"))]
    pub student_id: String,

    #[serde(default)]
    pub status: Option<AttendanceStatus>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSession {
    pub class_id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default = "default_mode")]
    pub check_in_mode: CheckInMode,
    #[serde(default)]
    pub geo_required: bool,
}

fn default_mode() -> CheckInMode {
    CheckInMode::SessionWide
}

#[derive(Clone)]
pub struct AttendanceRecorder {
    db: DatabaseConnection,
    tokens: TokenIssuer,
    broker: Arc<dyn SubscriptionBroker>,
    audit: Arc<dyn AuditSink>,
    roster: Option<Arc<dyn Roster>>,
}

impl AttendanceRecorder {
    /// Recorder with the database audit sink, and the database roster when
    /// `ENFORCE_ROSTER` is on.
    pub fn new(db: DatabaseConnection, broker: Arc<dyn SubscriptionBroker>) -> Self {
        let roster: Option<Arc<dyn Roster>> = if config::enforce_roster() {
            Some(Arc::new(DbRoster::new(db.clone())))
        } else {
            None
        };

        Self {
            tokens: TokenIssuer::new(db.clone()),
            audit: Arc::new(DbAuditSink::new(db.clone())),
            roster,
            broker,
            db,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.db_clone(), state.broker_clone())
    }

    pub fn with_tokens(mut self, tokens: TokenIssuer) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_roster(mut self, roster: Option<Arc<dyn Roster>>) -> Self {
        self.roster = roster;
        self
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    // ---------------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------------

    pub async fn create_session(&self, params: CreateSession) -> Result<Session, AppError> {
        params.validate()?;
        if let (Some(start), Some(end)) = (params.start_time, params.end_time) {
            if end < start {
                return Err(AppError::validation("end_time must not be before start_time"));
            }
        }

        let session = Session::create(
            &self.db,
            params.class_id,
            params.date,
            params.start_time,
            params.end_time,
            params.check_in_mode,
            params.geo_required,
        )
        .await?;

        info!(session_id = session.id, class_id = session.class_id, "session created");
        Ok(session)
    }

    pub async fn find_session(&self, session_id: i64) -> Result<Session, AppError> {
        Session::find(&self.db, session_id)
            .await?
            .ok_or(AppError::SessionNotFound(session_id))
    }

    /// Removes the session with its token and records, then tells its watchers.
    pub async fn delete_session(&self, session_id: i64) -> Result<(), AppError> {
        self.find_session(session_id).await?;

        let txn = self.db.begin().await?;
        let removed = AttendanceRecord::delete_for_session(&txn, session_id).await?;
        TokenEntity::delete_by_id(session_id).exec(&txn).await?;
        SessionEntity::delete_by_id(session_id).exec(&txn).await?;
        txn.commit().await?;

        info!(session_id, records = removed, "session deleted");

        self.broker
            .broadcast_to_session(session_id, &LiveEvent::SessionDeleted(SessionDeleted { session_id }))
            .await;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    pub async fn mark_via_token(
        &self,
        token: &str,
        student_id: &str,
        geo: Option<GeoPoint>,
    ) -> Result<AttendanceRecord, AppError> {
        self.mark_via_token_at(token, student_id, geo, Utc::now()).await
    }

    /// Redeems `token` for `student_id`. A second redemption for the same
    /// student and session returns the existing record untouched.
    pub async fn mark_via_token_at(
        &self,
        token: &str,
        student_id: &str,
        geo: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        require_non_blank("token", token)?;
        require_non_blank("student_id", student_id)?;
        if let Some(g) = &geo {
            g.validate()?;
        }
        let student_id = student_id.trim();

        let session_id = self.tokens.verify_at(token, now).await?;

        if self.roster.is_some() {
            let session = self.find_session(session_id).await?;
            self.ensure_enrolled(session.class_id, student_id).await?;
        }

        let (record, created) = AttendanceRecord::insert_if_absent(
            &self.db,
            NewRecord {
                session_id,
                student_id: student_id.to_owned(),
                status: AttendanceStatus::Present,
                note: None,
                lat: geo.map(|g| g.lat),
                long: geo.map(|g| g.long),
                accuracy: geo.and_then(|g| g.accuracy),
                marked_by: student_id.to_owned(),
                marked_at: now,
                source: RecordSource::TokenScan,
            },
        )
        .await?;

        if created {
            info!(session_id, student_id, record_id = record.id, "attendance recorded via token");
            self.publish(&record, &record.marked_by, record.marked_at).await;
            self.publish_stats(session_id).await;
        } else {
            debug!(session_id, student_id, "duplicate redemption, returning existing record");
        }

        Ok(record)
    }

    /// Marks every listed student in one transaction. Students that already
    /// have a record get it overwritten, never duplicated.
    pub async fn mark_bulk(
        &self,
        session_id: i64,
        default_status: AttendanceStatus,
        overrides: Vec<BulkEntry>,
        marked_by: &str,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        require_non_blank("marked_by", marked_by)?;
        if overrides.is_empty() {
            return Err(AppError::validation("At least one student is required"));
        }

        let mut seen = HashSet::with_capacity(overrides.len());
        for entry in &overrides {
            entry.validate()?;
            require_non_blank("student_id", &entry.student_id)?;
            if !seen.insert(entry.student_id.trim().to_owned()) {
                return Err(AppError::Validation(format!(
                    "Student {} appears more than once",
                    entry.student_id.trim()
                )));
            }
        }

        let session = self.find_session(session_id).await?;
        if self.roster.is_some() {
            for entry in &overrides {
                self.ensure_enrolled(session.class_id, entry.student_id.trim())
                    .await?;
            }
        }

        let now = Utc::now();
        let student_ids: Vec<String> = overrides
            .iter()
            .map(|e| e.student_id.trim().to_owned())
            .collect();
        let rows: Vec<NewRecord> = overrides
            .into_iter()
            .map(|e| NewRecord {
                session_id,
                student_id: e.student_id.trim().to_owned(),
                status: e.status.unwrap_or(default_status),
                note: e.note.filter(|n| !n.trim().is_empty()),
                lat: None,
                long: None,
                accuracy: None,
                marked_by: marked_by.to_owned(),
                marked_at: now,
                source: RecordSource::Manual,
            })
            .collect();

        let txn = self.db.begin().await?;
        AttendanceRecord::upsert_many(&txn, rows).await?;
        let stored = AttendanceRecord::find_many_for(&txn, session_id, &student_ids).await?;
        txn.commit().await?;

        let mut by_student: HashMap<String, AttendanceRecord> = stored
            .into_iter()
            .map(|r| (r.student_id.clone(), r))
            .collect();
        let written: Vec<AttendanceRecord> = student_ids
            .iter()
            .filter_map(|id| by_student.remove(id))
            .collect();

        info!(session_id, marked_by, count = written.len(), "bulk attendance recorded");

        for record in &written {
            self.publish(record, marked_by, now).await;
        }
        self.publish_stats(session_id).await;

        Ok(written)
    }

    /// Changes status and optionally the note of one record.
    ///
    /// `new_note: None` keeps the note, `Some("")` clears it. Only a real
    /// change is audited, but watchers hear about every call.
    pub async fn update(
        &self,
        record_id: i64,
        new_status: AttendanceStatus,
        new_note: Option<String>,
        updated_by: &str,
    ) -> Result<AttendanceRecord, AppError> {
        require_non_blank("updated_by", updated_by)?;
        if new_note.as_ref().is_some_and(|n| n.chars().count() > 1000) {
            return Err(AppError::validation("Note must be at most 1000 characters"));
        }

        let record = RecordEntity::find_by_id(record_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::RecordNotFound(record_id))?;

        let now = Utc::now();
        let mut diff = Map::new();

        if record.status != new_status {
            diff.insert(
                "status".into(),
                json!({ "from": record.status, "to": new_status }),
            );
        }

        let next_note = new_note.map(|n| Some(n.trim().to_owned()).filter(|n| !n.is_empty()));
        if let Some(note) = &next_note {
            if *note != record.note {
                diff.insert("note".into(), json!({ "from": record.note, "to": note }));
            }
        }

        let updated = if diff.is_empty() {
            record
        } else {
            let mut active = record.into_active_model();
            active.status = Set(new_status);
            if let Some(note) = next_note {
                active.note = Set(note);
            }
            active.marked_by = Set(updated_by.to_owned());
            active.marked_at = Set(now);
            let saved = active.update(&self.db).await?;

            let entry = AuditEntry {
                entity_type: "attendance_record",
                entity_id: saved.id,
                action: "update",
                actor: updated_by.to_owned(),
                diff: Value::Object(diff),
            };
            if let Err(e) = self.audit.record(entry).await {
                warn!(record_id, error = %e, "audit write failed, continuing");
            }
            info!(record_id, session_id = saved.session_id, updated_by, "attendance record updated");
            saved
        };

        self.publish(&updated, updated_by, now).await;
        self.publish_stats(updated.session_id).await;

        Ok(updated)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub async fn list(&self, session_id: i64) -> Result<Vec<AttendanceRecord>, AppError> {
        self.find_session(session_id).await?;
        Ok(AttendanceRecord::list_for_session(&self.db, session_id).await?)
    }

    pub async fn stats(&self, session_id: i64) -> Result<SessionStats, AppError> {
        let counts = AttendanceRecord::status_counts(&self.db, session_id).await?;

        let mut stats = SessionStats {
            session_id,
            ..Default::default()
        };
        for (status, n) in counts {
            let n = u64::try_from(n).unwrap_or(0);
            stats.total += n;
            match status {
                AttendanceStatus::Present => stats.present += n,
                AttendanceStatus::Absent => stats.absent += n,
                AttendanceStatus::Late => stats.late += n,
                AttendanceStatus::Excused => stats.excused += n,
                AttendanceStatus::Leave => stats.leave += n,
            }
        }
        Ok(stats)
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    async fn ensure_enrolled(&self, class_id: i64, student_id: &str) -> Result<(), AppError> {
        let Some(roster) = &self.roster else {
            return Ok(());
        };
        if roster.is_enrolled(class_id, student_id).await? {
            Ok(())
        } else {
            Err(AppError::StudentNotEnrolled {
                class_id,
                student_id: student_id.to_owned(),
            })
        }
    }

    async fn publish(&self, record: &AttendanceRecord, marked_by: &str, marked_at: DateTime<Utc>) {
        let payload = AttendanceUpdated {
            session_id: record.session_id,
            student_id: record.student_id.clone(),
            status: record.status.to_string(),
            marked_by: marked_by.to_owned(),
            marked_at: marked_at.to_rfc3339(),
        };
        let d = self
            .broker
            .broadcast_attendance_update(record.session_id, payload)
            .await;
        debug!(
            session_id = record.session_id,
            delivered = d.delivered,
            dropped = d.dropped,
            "attendance update fanned out"
        );
    }

    async fn publish_stats(&self, session_id: i64) {
        match self.stats(session_id).await {
            Ok(stats) => {
                self.broker.broadcast_session_stats(session_id, stats).await;
            }
            Err(e) => warn!(session_id, error = %e, "could not compute session stats"),
        }
    }
}
