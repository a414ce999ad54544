pub mod attendance_record;
pub mod audit_log;
pub mod check_in_token;
pub mod enrollment;
pub mod session;

pub use attendance_record::Entity as AttendanceRecord;
pub use audit_log::Entity as AuditLog;
pub use check_in_token::Entity as CheckInToken;
pub use enrollment::Entity as Enrollment;
pub use session::Entity as Session;
