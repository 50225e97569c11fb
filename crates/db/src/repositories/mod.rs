//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod checkin_repo;
pub mod goal_repo;
pub mod progress_repo;
pub mod session_repo;
pub mod setting_repo;
pub mod user_repo;

pub use checkin_repo::DailyCheckinRepo;
pub use goal_repo::GoalRepo;
pub use progress_repo::ProgressLogRepo;
pub use session_repo::SessionRepo;
pub use setting_repo::SettingRepo;
pub use user_repo::UserRepo;
