use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::PaginatorTrait;
use serde::{Deserialize, Serialize};

/// Class roster entry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn enroll<C>(db: &C, class_id: i64, student_id: &str) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::insert(ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id.to_owned()),
        })
        .on_conflict(
            OnConflict::columns([Column::ClassId, Column::StudentId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
        Ok(())
    }

    pub async fn is_enrolled<C>(db: &C, class_id: i64, student_id: &str) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let n = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .count(db)
            .await?;
        Ok(n > 0)
    }
}
