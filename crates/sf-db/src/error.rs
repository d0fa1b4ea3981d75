//! Error types for sf-db

use thiserror::Error;

/// Platform error number: the role has no usage on the warehouse
pub const ERR_OBJECT_NOT_ACCESSIBLE: i64 = 2043;

/// Platform error number: no active warehouse in the session
pub const ERR_NO_ACTIVE_WAREHOUSE: i64 = 606;

/// Message the platform returns alongside error 2043
pub const ERROR_MESSAGE_2043: &str = "Object does not exist, or operation cannot be performed.";

/// Message the platform returns alongside error 606
pub const ERROR_MESSAGE_606: &str = "No active warehouse selected in the current session.";

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Connection failed: {0}")]
    ConnectionError(String),

    /// Statement rejected by the platform (D002)
    #[error("[D002] {errno:06}: {message}")]
    Sql {
        errno: i64,
        message: String,
        sql_state: Option<String>,
    },

    /// Response could not be interpreted (D003)
    #[error("[D003] Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    /// Local file could not be read for upload (D004)
    #[error("[D004] Cannot upload {path}: {message}")]
    Upload { path: String, message: String },

    /// Not implemented (D005)
    #[error("[D005] Feature not implemented for {backend}: {feature}")]
    NotImplemented { backend: String, feature: String },

    /// Mutex poisoned (D006)
    #[error("[D006] Session mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Query returned no usable result (D007)
    #[error("[D007] Could not read the result of SQL query: {0}")]
    EmptyResult(String),

    /// Qualified name combined with an explicit `in` clause (D008)
    #[error("[D008] Cannot combine qualified name '{name}' with in clause '{in_clause}'")]
    QualifiedNameWithInClause { name: String, in_clause: String },

    /// More than one row matched a single-object lookup (D009)
    #[error("[D009] Received multiple rows from result of SQL statement: {0}")]
    MultipleRows(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Build a platform SQL error
    pub fn sql(errno: i64, message: impl Into<String>) -> Self {
        DbError::Sql {
            errno,
            message: message.into(),
            sql_state: None,
        }
    }

    /// Platform error number, if this is a SQL error
    pub fn errno(&self) -> Option<i64> {
        match self {
            DbError::Sql { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Platform error message, if this is a SQL error
    pub fn sql_message(&self) -> Option<&str> {
        match self {
            DbError::Sql { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the message reports a missing or inaccessible object
    pub fn is_does_not_exist(&self) -> bool {
        self.sql_message()
            .is_some_and(|m| m.contains("does not exist or not authorized"))
    }

    /// Attach a remediation hint to well-known SQL failures.
    ///
    /// Errors 2043 and 606 explain how to fix warehouse access; a
    /// "does not exist or not authorized" message points at the name or role.
    /// The error number is preserved; everything else passes through.
    pub fn with_remediation_hint(self, role: Option<&str>, warehouse: Option<&str>) -> Self {
        let DbError::Sql {
            errno,
            message,
            sql_state,
        } = self
        else {
            return self;
        };

        let hint = if errno == ERR_OBJECT_NOT_ACCESSIBLE || message.contains(ERROR_MESSAGE_2043) {
            format!(
                "'{}' may not have access to warehouse '{}'.\nPlease grant usage privilege on warehouse to this role.",
                role.unwrap_or("None"),
                warehouse.unwrap_or("None")
            )
        } else if errno == ERR_NO_ACTIVE_WAREHOUSE || message.contains(ERROR_MESSAGE_606) {
            "Please provide a warehouse for the active session role in your project definition file, config.toml file, or via command line.".to_string()
        } else if message.contains("does not exist or not authorized") {
            "Please check the name of the resource you are trying to query or the permissions of the role you are using to run the query.".to_string()
        } else {
            return DbError::Sql {
                errno,
                message,
                sql_state,
            };
        };

        DbError::Sql {
            errno,
            message: format!(
                "Received error message '{}' while executing SQL statement.\n{}",
                message, hint
            ),
            sql_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warehouse_access_hint() {
        let err = DbError::sql(2043, ERROR_MESSAGE_2043)
            .with_remediation_hint(Some("app_role"), Some("app_warehouse"));
        assert_eq!(err.errno(), Some(2043));
        let msg = err.sql_message().unwrap();
        assert!(msg.contains("Please grant usage privilege on warehouse to this role."));
        assert!(msg.contains("'app_role' may not have access to warehouse 'app_warehouse'"));
    }

    #[test]
    fn test_missing_warehouse_hint() {
        let err = DbError::sql(606, "No active warehouse selected in the current session")
            .with_remediation_hint(None, None);
        assert!(err
            .sql_message()
            .unwrap()
            .contains("Please provide a warehouse for the active session role"));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = DbError::sql(1234, "Some Error Message.").with_remediation_hint(None, None);
        assert_eq!(err.sql_message(), Some("Some Error Message."));

        let err = DbError::ConnectionError("down".to_string()).with_remediation_hint(None, None);
        assert!(matches!(err, DbError::ConnectionError(_)));
    }

    #[test]
    fn test_display_pads_errno() {
        let err = DbError::sql(606, "no warehouse");
        assert_eq!(err.to_string(), "[D002] 000606: no warehouse");
    }
}
