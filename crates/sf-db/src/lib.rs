//! sf-db - Session abstraction layer for snow
//!
//! This crate provides the `Session` trait that every deployment engine
//! executes statements through, RAII guards that switch the session role or
//! warehouse and restore it on every exit path, and a blocking backend for
//! the platform SQL REST API.

pub mod error;
pub mod guard;
pub mod result;
pub mod snowflake;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::{
    DbError, DbResult, ERROR_MESSAGE_2043, ERROR_MESSAGE_606, ERR_NO_ACTIVE_WAREHOUSE,
    ERR_OBJECT_NOT_ACCESSIBLE,
};
pub use guard::{RoleGuard, WarehouseGuard};
pub use result::{QueryResult, Row};
pub use snowflake::SqlApiSession;
pub use traits::{current_role, current_warehouse, put_statement, show_specific_object, Session};
