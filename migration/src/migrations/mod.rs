pub mod m202509080001_create_sessions;
pub mod m202509080002_create_check_in_tokens;
pub mod m202509080003_create_attendance_records;
pub mod m202509080004_create_audit_logs;
pub mod m202509080005_create_enrollments;
