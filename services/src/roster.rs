//! Enrollment lookup used when roster enforcement is on.

use async_trait::async_trait;
use db::models::enrollment::Model as Enrollment;
use sea_orm::DatabaseConnection;

use crate::error::AppError;

#[async_trait]
pub trait Roster: Send + Sync + 'static {
    async fn is_enrolled(&self, class_id: i64, student_id: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct DbRoster {
    db: DatabaseConnection,
}

impl DbRoster {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Roster for DbRoster {
    async fn is_enrolled(&self, class_id: i64, student_id: &str) -> Result<bool, AppError> {
        Ok(Enrollment::is_enrolled(&self.db, class_id, student_id).await?)
    }
}
