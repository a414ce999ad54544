mod attendance_test;
mod health_test;
mod records_test;
mod sessions_test;
mod system_test;
