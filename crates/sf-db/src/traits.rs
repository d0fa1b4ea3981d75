//! Session trait definition and lookups shared by every backend

use crate::error::{DbError, DbResult};
use crate::result::{QueryResult, Row};
use sf_core::identifier::{identifier_to_show_like_pattern, split_qualified, unquote_identifier};
use std::path::Path;

/// Explicit session handle for the data platform
///
/// A session is exclusively owned by one invocation and carries mutable
/// server-side state (current role and warehouse). Implementations use
/// interior mutability so guards and processors can share `&self`.
pub trait Session: Send + Sync {
    /// Execute one statement and return its rows
    fn execute(&self, sql: &str) -> DbResult<QueryResult>;

    /// Execute a `;`-separated batch in one round-trip, one result per statement
    fn execute_many(&self, batch: &str) -> DbResult<Vec<QueryResult>>;

    /// Upload a local file to a stage path
    fn put(
        &self,
        local_path: &Path,
        stage_path: &str,
        parallel: usize,
        overwrite: bool,
    ) -> DbResult<QueryResult>;

    /// Whether `put` can upload files on this backend
    fn supports_put(&self) -> bool {
        true
    }

    /// Backend identifier for logging
    fn backend_name(&self) -> &'static str;
}

/// The `put` statement a connector issues for one upload
pub fn put_statement(local_path: &Path, stage_path: &str, parallel: usize, overwrite: bool) -> String {
    format!(
        "put file://{} {} auto_compress=false parallel={} overwrite={}",
        local_path.display(),
        stage_path,
        parallel,
        overwrite
    )
}

/// Role the session is currently using
pub fn current_role(session: &dyn Session) -> DbResult<String> {
    let sql = "select current_role()";
    session
        .execute(sql)?
        .scalar()
        .map(str::to_string)
        .ok_or_else(|| DbError::EmptyResult(sql.to_string()))
}

/// Warehouse the session is currently using, if any
pub fn current_warehouse(session: &dyn Session) -> DbResult<Option<String>> {
    Ok(session
        .execute("select current_warehouse()")?
        .scalar()
        .map(str::to_string))
}

/// Look up a single object by name with `show <objects> like '<name>'`.
///
/// Qualified names are turned into an `in schema` clause. The row whose
/// `name_col` equals the resolved identifier is returned.
pub fn show_specific_object(
    session: &dyn Session,
    object_type_plural: &str,
    name: &str,
    name_col: &str,
    in_clause: Option<&str>,
) -> DbResult<Option<Row>> {
    let parts = split_qualified(name);
    let (unqualified, in_clause) = match (parts.split_last(), in_clause) {
        (Some((last, prefix)), None) if !prefix.is_empty() => {
            (*last, Some(format!("in schema {}", prefix.join("."))))
        }
        (Some((_, prefix)), Some(clause)) if !prefix.is_empty() => {
            return Err(DbError::QualifiedNameWithInClause {
                name: name.to_string(),
                in_clause: clause.to_string(),
            });
        }
        (_, clause) => (name, clause.map(str::to_string)),
    };

    let mut sql = format!(
        "show {} like {}",
        object_type_plural,
        identifier_to_show_like_pattern(unqualified)
    );
    if let Some(clause) = in_clause {
        sql.push(' ');
        sql.push_str(&clause);
    }

    let wanted = unquote_identifier(unqualified);
    let result = session.execute(&sql)?;
    let mut matches = result
        .rows
        .into_iter()
        .filter(|row| row.get(name_col) == Some(wanted.as_str()));
    let first = matches.next();
    if matches.next().is_some() {
        return Err(DbError::MultipleRows(sql));
    }
    Ok(first)
}

#[cfg(test)]
#[path = "traits_test.rs"]
mod tests;
