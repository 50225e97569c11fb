//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create/upsert DTO for inserts
//! - An update DTO (all `Option` fields) where rows are patched

pub mod checkin;
pub mod goal;
pub mod progress;
pub mod session;
pub mod setting;
pub mod user;
