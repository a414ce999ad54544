use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, OnConflict};
use serde::{Deserialize, Serialize};

/// The single redeemable value of a session. Rotation rewrites this row in place.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_in_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(unique)]
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
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

impl Model {
    /// Expired strictly after `expires_at`; the boundary instant is still valid.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub async fn find_by_value<C>(db: &C, value: &str) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find().filter(Column::Value.eq(value)).one(db).await
    }

    pub async fn find_by_session<C>(db: &C, session_id: i64) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(session_id).one(db).await
    }

    /// Creates the session's token or replaces its value and expiry.
    ///
    /// One `INSERT .. ON CONFLICT(session_id) DO UPDATE` statement, so a
    /// concurrent lookup sees either the old row or the new one.
    pub async fn upsert<C>(
        db: &C,
        session_id: i64,
        value: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        let am = ActiveModel {
            session_id: Set(session_id),
            value: Set(value.to_owned()),
            expires_at: Set(expires_at),
            rotated_at: Set(None),
            created_at: Set(now),
        };

        Entity::insert(am)
            .on_conflict(
                OnConflict::column(Column::SessionId)
                    .update_columns([Column::Value, Column::ExpiresAt])
                    .value(Column::RotatedAt, Expr::value(now))
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }
}
