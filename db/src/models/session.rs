use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One class meeting that students can check in to.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub check_in_mode: CheckInMode,
    /// Advisory: clients should send a location, the server does not insist.
    pub geo_required: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CheckInMode {
    #[sea_orm(string_value = "session_wide")]
    SessionWide,

    #[sea_orm(string_value = "per_student")]
    PerStudent,

    #[sea_orm(string_value = "off")]
    Off,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::check_in_token::Entity")]
    Token,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::check_in_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Token.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C>(
        db: &C,
        class_id: i64,
        date: NaiveDate,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
        check_in_mode: CheckInMode,
        geo_required: bool,
    ) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        ActiveModel {
            id: NotSet,
            class_id: Set(class_id),
            date: Set(date),
            start_time: Set(start_time),
            end_time: Set(end_time),
            check_in_mode: Set(check_in_mode),
            geo_required: Set(geo_required),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }

    pub async fn find<C>(db: &C, id: i64) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(id).one(db).await
    }

    #[inline]
    pub fn accepts_check_in(&self) -> bool {
        self.check_in_mode != CheckInMode::Off
    }
}
