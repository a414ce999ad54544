use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One student's attendance in one session. `(session_id, student_id)` is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: i64,
    pub student_id: String,
    pub status: AttendanceStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub accuracy: Option<f64>,
    pub marked_by: String,
    pub marked_at: DateTime<Utc>,
    pub source: RecordSource,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,

    #[sea_orm(string_value = "late")]
    Late,

    #[sea_orm(string_value = "excused")]
    Excused,

    #[sea_orm(string_value = "leave")]
    Leave,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RecordSource {
    #[sea_orm(string_value = "manual")]
    Manual,

    #[sea_orm(string_value = "token_scan")]
    TokenScan,

    #[sea_orm(string_value = "api")]
    Api,

    #[sea_orm(string_value = "biometric")]
    Biometric,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Session,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields of a record about to be written; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub session_id: i64,
    pub student_id: String,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub accuracy: Option<f64>,
    pub marked_by: String,
    pub marked_at: DateTime<Utc>,
    pub source: RecordSource,
}

impl From<NewRecord> for ActiveModel {
    fn from(r: NewRecord) -> Self {
        ActiveModel {
            id: NotSet,
            session_id: Set(r.session_id),
            student_id: Set(r.student_id),
            status: Set(r.status),
            note: Set(r.note),
            lat: Set(r.lat),
            long: Set(r.long),
            accuracy: Set(r.accuracy),
            marked_by: Set(r.marked_by),
            marked_at: Set(r.marked_at),
            source: Set(r.source),
        }
    }
}

impl Model {
    pub async fn find_for<C>(db: &C, session_id: i64, student_id: &str) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    /// Inserts the record unless one already exists for the same
    /// `(session_id, student_id)`. Returns the stored row and whether this
    /// call created it. The uniqueness check lives in the table, so two
    /// racing callers cannot both create.
    pub async fn insert_if_absent<C>(db: &C, new: NewRecord) -> Result<(Self, bool), DbErr>
    where
        C: ConnectionTrait,
    {
        let session_id = new.session_id;
        let student_id = new.student_id.clone();

        let affected = Entity::insert(ActiveModel::from(new))
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        let row = Self::find_for(db, session_id, &student_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("attendance {session_id}/{student_id}")))?;

        Ok((row, affected > 0))
    }

    /// Writes every row, overwriting the status, note, marker and source of
    /// rows that already exist for the same student.
    pub async fn upsert_many<C>(db: &C, rows: Vec<NewRecord>) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        if rows.is_empty() {
            return Ok(0);
        }
        let n = rows.len() as u64;

        Entity::insert_many(rows.into_iter().map(ActiveModel::from))
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .update_columns([
                        Column::Status,
                        Column::Note,
                        Column::MarkedBy,
                        Column::MarkedAt,
                        Column::Source,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Ok(n)
    }

    pub async fn find_many_for<C>(db: &C, session_id: i64, student_ids: &[String]) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::StudentId.is_in(student_ids.iter().cloned()))
            .all(db)
            .await
    }

    pub async fn list_for_session<C>(db: &C, session_id: i64) -> Result<Vec<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_asc(Column::MarkedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Row count per status for one session. Statuses with no rows are absent.
    pub async fn status_counts<C>(db: &C, session_id: i64) -> Result<Vec<(AttendanceStatus, i64)>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .select_only()
            .column(Column::Status)
            .column_as(Column::Id.count(), "n")
            .filter(Column::SessionId.eq(session_id))
            .group_by(Column::Status)
            .into_tuple::<(AttendanceStatus, i64)>()
            .all(db)
            .await
    }

    pub async fn delete_for_session<C>(db: &C, session_id: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        let res = Entity::delete_many()
            .filter(Column::SessionId.eq(session_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }
}
