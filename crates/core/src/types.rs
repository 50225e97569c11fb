/// All database primary keys are PostgreSQL `UUID` (`gen_random_uuid()`).
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (deadlines, check-in days) carry no time zone.
pub type Date = chrono::NaiveDate;
