use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202509080001_create_sessions::Migration),
            Box::new(migrations::m202509080002_create_check_in_tokens::Migration),
            Box::new(migrations::m202509080003_create_attendance_records::Migration),
            Box::new(migrations::m202509080004_create_audit_logs::Migration),
            Box::new(migrations::m202509080005_create_enrollments::Migration),
        ]
    }
}
