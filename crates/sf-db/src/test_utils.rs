//! Scripted session for exercising code that issues SQL
//!
//! Tests enqueue the exact statements they expect, in order, together with
//! the result or error each should produce. Any statement that does not match
//! the next expectation fails the test.

use crate::error::{DbError, DbResult};
use crate::result::QueryResult;
use crate::traits::{put_statement, Session};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Execute,
    ExecuteMany,
    Put,
}

enum Outcome {
    Results(Vec<QueryResult>),
    Error(DbError),
}

struct Expectation {
    kind: CallKind,
    sql: String,
    outcome: Outcome,
}

/// Session double that replays an ordered script of statements
#[derive(Default)]
pub struct ScriptedSession {
    script: Mutex<VecDeque<Expectation>>,
    calls: Mutex<Vec<String>>,
    put_disabled: bool,
}

/// Collapse runs of whitespace so multi-line SQL compares by content
fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl ScriptedSession {
    /// Create a session with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, kind: CallKind, sql: &str, outcome: Outcome) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Expectation {
                kind,
                sql: normalize(sql),
                outcome,
            });
        self
    }

    /// Report that this session cannot upload files
    pub fn without_put(mut self) -> Self {
        self.put_disabled = true;
        self
    }

    /// Expect `sql` and answer with `result`
    pub fn expect(self, sql: &str, result: QueryResult) -> Self {
        self.push(CallKind::Execute, sql, Outcome::Results(vec![result]))
    }

    /// Expect `sql` and answer with an empty result
    pub fn expect_ok(self, sql: &str) -> Self {
        self.expect(sql, QueryResult::empty())
    }

    /// Expect `sql` and fail it with `error`
    pub fn expect_err(self, sql: &str, error: DbError) -> Self {
        self.push(CallKind::Execute, sql, Outcome::Error(error))
    }

    /// Expect a multi-statement batch answered with one empty result per statement
    pub fn expect_many(self, batch: &str) -> Self {
        let count = batch.split(';').filter(|s| !s.trim().is_empty()).count();
        self.push(
            CallKind::ExecuteMany,
            batch,
            Outcome::Results(vec![QueryResult::empty(); count]),
        )
    }

    /// Expect a file upload
    pub fn expect_put(self, local_path: &Path, stage_path: &str, parallel: usize, overwrite: bool) -> Self {
        let sql = put_statement(local_path, stage_path, parallel, overwrite);
        self.push(CallKind::Put, &sql, Outcome::Results(vec![QueryResult::empty()]))
    }

    /// Every statement issued so far, whitespace-normalized
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Panic unless every scripted statement was issued
    pub fn assert_done(&self) {
        let script = self.script.lock().expect("script lock");
        let remaining: Vec<&str> = script.iter().map(|e| e.sql.as_str()).collect();
        assert!(
            remaining.is_empty(),
            "scripted statements never issued: {:#?}\nissued: {:#?}",
            remaining,
            self.calls()
        );
    }

    fn next(&self, kind: CallKind, sql: &str) -> DbResult<Vec<QueryResult>> {
        let sql = normalize(sql);
        self.calls.lock().expect("calls lock").push(sql.clone());

        let expectation = self.script.lock().expect("script lock").pop_front();
        let mismatch = match &expectation {
            None => Some("no statement was expected".to_string()),
            Some(e) if e.kind != kind || e.sql != sql => {
                Some(format!("expected {:?} `{}`", e.kind, e.sql))
            }
            Some(_) => None,
        };
        if let Some(reason) = mismatch {
            let message = format!("unexpected {:?} `{}`: {}", kind, sql, reason);
            // A second panic while unwinding would abort the test binary.
            if std::thread::panicking() {
                return Err(DbError::UnexpectedResponse {
                    endpoint: "scripted".to_string(),
                    message,
                });
            }
            panic!("{}", message);
        }

        match expectation.map(|e| e.outcome) {
            Some(Outcome::Results(results)) => Ok(results),
            Some(Outcome::Error(error)) => Err(error),
            None => Err(DbError::EmptyResult(sql)),
        }
    }
}

impl Session for ScriptedSession {
    fn execute(&self, sql: &str) -> DbResult<QueryResult> {
        let mut results = self.next(CallKind::Execute, sql)?;
        Ok(results.pop().unwrap_or_default())
    }

    fn execute_many(&self, batch: &str) -> DbResult<Vec<QueryResult>> {
        self.next(CallKind::ExecuteMany, batch)
    }

    fn put(
        &self,
        local_path: &Path,
        stage_path: &str,
        parallel: usize,
        overwrite: bool,
    ) -> DbResult<QueryResult> {
        let sql = put_statement(local_path, stage_path, parallel, overwrite);
        let mut results = self.next(CallKind::Put, &sql)?;
        Ok(results.pop().unwrap_or_default())
    }

    fn supports_put(&self) -> bool {
        !self.put_disabled
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}
