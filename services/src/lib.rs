pub mod attendance_recorder;
pub mod audit;
pub mod error;
pub mod roster;
pub mod token_issuer;

pub use attendance_recorder::AttendanceRecorder;
pub use error::AppError;
pub use token_issuer::{IssuedToken, TokenIssuer};
