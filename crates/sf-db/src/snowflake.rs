//! Platform SQL REST API backend
//!
//! Every request is stateless on the server side, so the session role,
//! warehouse, database and schema are tracked here and sent with each
//! statement. `use ...` statements are still executed remotely so access
//! problems surface at the point of the switch.

use crate::error::{DbError, DbResult};
use crate::result::QueryResult;
use crate::traits::Session;
use serde::Deserialize;
use serde_json::{json, Value};
use sf_core::ConnectionConfig;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

const STATEMENTS_PATH: &str = "/api/v2/statements";
const DEFAULT_TOKEN_TYPE: &str = "OAUTH";
const STATEMENT_TIMEOUT_SECS: u64 = 600;
const POLL_INTERVAL: Duration = Duration::from_millis(500);
const USER_AGENT: &str = concat!("snow/", env!("CARGO_PKG_VERSION"));

/// Session state the server would otherwise keep
#[derive(Debug, Clone, Default, PartialEq)]
struct SessionState {
    role: Option<String>,
    warehouse: Option<String>,
    database: Option<String>,
    schema: Option<String>,
}

/// A `use <kind> <name>` statement recognised client-side
#[derive(Debug, PartialEq)]
enum UseStatement {
    Role(String),
    Warehouse(String),
    Database(String),
    Schema(String),
}

/// Blocking session over the platform SQL REST API
pub struct SqlApiSession {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    token_type: String,
    state: Mutex<SessionState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sql_state: Option<String>,
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    statement_handles: Option<Vec<String>>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<ColumnType>,
    #[serde(default)]
    partition_info: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

/// How a finished HTTP exchange should be treated
enum Answer {
    Done(StatementResponse),
    Pending(String),
}

impl SqlApiSession {
    /// Build a session from a connection profile.
    ///
    /// The profile must name an account or host and carry a token.
    pub fn from_connection(connection: &ConnectionConfig) -> DbResult<Self> {
        let host = match (&connection.host, &connection.account) {
            (Some(host), _) => host.clone(),
            (None, Some(account)) => format!("{}.snowflakecomputing.com", account),
            (None, None) => {
                return Err(DbError::ConnectionError(
                    "connection profile needs an 'account' or 'host'".to_string(),
                ))
            }
        };
        let token = connection.token.clone().ok_or_else(|| {
            DbError::ConnectionError(
                "connection profile needs a 'token' for the SQL API".to_string(),
            )
        })?;
        let base_url = match connection.port {
            Some(port) => format!("https://{}:{}", host, port),
            None => format!("https://{}", host),
        };

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build();

        Ok(Self {
            agent,
            base_url,
            token,
            token_type: connection
                .token_type
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            state: Mutex::new(SessionState {
                role: connection.role.clone(),
                warehouse: connection.warehouse.clone(),
                database: connection.database.clone(),
                schema: connection.schema.clone(),
            }),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn state(&self) -> DbResult<SessionState> {
        self.state
            .lock()
            .map(|s| s.clone())
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn apply_use(&self, statement: UseStatement) -> DbResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        match statement {
            UseStatement::Role(name) => state.role = Some(name),
            UseStatement::Warehouse(name) => state.warehouse = Some(name),
            UseStatement::Database(name) => state.database = Some(name),
            UseStatement::Schema(name) => state.schema = Some(name),
        }
        Ok(())
    }

    fn request_body(&self, sql: &str, multi: bool) -> DbResult<Value> {
        let state = self.state()?;
        let mut body = json!({
            "statement": sql,
            "timeout": STATEMENT_TIMEOUT_SECS,
        });
        for (key, value) in [
            ("role", state.role),
            ("warehouse", state.warehouse),
            ("database", state.database),
            ("schema", state.schema),
        ] {
            if let Some(value) = value {
                body[key] = Value::String(value);
            }
        }
        if multi {
            body["parameters"] = json!({ "MULTI_STATEMENT_COUNT": "0" });
        }
        Ok(body)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("X-Snowflake-Authorization-Token-Type", &self.token_type)
            .set("Accept", "application/json")
    }

    fn submit(&self, sql: &str, multi: bool) -> DbResult<StatementResponse> {
        let url = format!("{}{}", self.base_url, STATEMENTS_PATH);
        log::debug!("Executing via {}: {}", self.backend_name(), sql);
        let body = self.request_body(sql, multi)?;
        let answer = interpret(&url, self.authorized(self.agent.post(&url)).send_json(body))?;
        self.wait(answer)
    }

    fn wait(&self, mut answer: Answer) -> DbResult<StatementResponse> {
        loop {
            match answer {
                Answer::Done(response) => return Ok(response),
                Answer::Pending(handle) => {
                    thread::sleep(POLL_INTERVAL);
                    answer = self.fetch(&handle, None)?;
                }
            }
        }
    }

    fn fetch(&self, handle: &str, partition: Option<usize>) -> DbResult<Answer> {
        let url = format!("{}{}/{}", self.base_url, STATEMENTS_PATH, handle);
        let mut request = self.authorized(self.agent.get(&url));
        if let Some(partition) = partition {
            request = request.query("partition", &partition.to_string());
        }
        interpret(&url, request.call())
    }

    /// Assemble all partitions of a finished statement into rows
    fn collect(&self, response: StatementResponse) -> DbResult<QueryResult> {
        let Some(meta) = response.result_set_meta_data else {
            return Ok(QueryResult::empty());
        };
        let mut rows = response.data.unwrap_or_default();
        if let Some(handle) = response.statement_handle.as_deref() {
            for partition in 1..meta.partition_info.len() {
                let page = match self.fetch(handle, Some(partition))? {
                    Answer::Done(page) => page,
                    Answer::Pending(handle) => self.wait(Answer::Pending(handle))?,
                };
                rows.extend(page.data.unwrap_or_default());
            }
        }
        Ok(QueryResult::new(
            meta.row_type.into_iter().map(|c| c.name),
            rows.into_iter()
                .map(|row| row.into_iter().map(cell_text).collect())
                .collect(),
        ))
    }
}

impl Session for SqlApiSession {
    fn execute(&self, sql: &str) -> DbResult<QueryResult> {
        let response = self.submit(sql, false)?;
        let result = self.collect(response)?;
        if let Some(statement) = parse_use_statement(sql) {
            self.apply_use(statement)?;
        }
        Ok(result)
    }

    fn execute_many(&self, batch: &str) -> DbResult<Vec<QueryResult>> {
        let response = self.submit(batch, true)?;
        let handles = response.statement_handles.clone().unwrap_or_default();
        if handles.is_empty() {
            return Ok(vec![self.collect(response)?]);
        }
        handles
            .iter()
            .map(|handle| {
                let answer = self.fetch(handle, None)?;
                let response = self.wait(answer)?;
                self.collect(response)
            })
            .collect()
    }

    fn put(
        &self,
        local_path: &Path,
        _stage_path: &str,
        _parallel: usize,
        _overwrite: bool,
    ) -> DbResult<QueryResult> {
        Err(DbError::NotImplemented {
            backend: self.backend_name().to_string(),
            feature: format!("file upload of {}", local_path.display()),
        })
    }

    fn supports_put(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "sql-api"
    }
}

/// Map a transport outcome to a finished response, a pending handle or an error
fn interpret(endpoint: &str, outcome: Result<ureq::Response, ureq::Error>) -> DbResult<Answer> {
    match outcome {
        Ok(response) if response.status() == 202 => {
            let body = read_body(endpoint, response)?;
            body.statement_handle
                .map(Answer::Pending)
                .ok_or_else(|| DbError::UnexpectedResponse {
                    endpoint: endpoint.to_string(),
                    message: "202 without statementHandle".to_string(),
                })
        }
        Ok(response) => Ok(Answer::Done(read_body(endpoint, response)?)),
        Err(ureq::Error::Status(status, response)) => {
            let body = read_body(endpoint, response).ok();
            Err(status_error(status, body))
        }
        Err(ureq::Error::Transport(transport)) => {
            Err(DbError::ConnectionError(transport.to_string()))
        }
    }
}

fn read_body(endpoint: &str, response: ureq::Response) -> DbResult<StatementResponse> {
    response
        .into_json()
        .map_err(|e| DbError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
}

/// Build the error for a non-success HTTP status
fn status_error(status: u16, body: Option<StatementResponse>) -> DbError {
    match body {
        Some(StatementResponse {
            code: Some(code),
            message,
            sql_state,
            ..
        }) => match parse_errno(&code) {
            Some(errno) => DbError::Sql {
                errno,
                message: message.unwrap_or_default(),
                sql_state,
            },
            None => DbError::ConnectionError(format!(
                "HTTP {} ({}): {}",
                status,
                code,
                message.unwrap_or_default()
            )),
        },
        Some(StatementResponse { message, .. }) => DbError::ConnectionError(format!(
            "HTTP {}: {}",
            status,
            message.unwrap_or_default()
        )),
        None => DbError::ConnectionError(format!("HTTP {}", status)),
    }
}

/// Platform error numbers come back as zero-padded strings, e.g. `002043`
fn parse_errno(code: &str) -> Option<i64> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Recognise `use [secondary] role|warehouse|database|schema <name>`
fn parse_use_statement(sql: &str) -> Option<UseStatement> {
    let sql = sql.trim().trim_end_matches(';');
    let mut words = sql.split_whitespace();
    if !words.next()?.eq_ignore_ascii_case("use") {
        return None;
    }
    let kind = words.next()?.to_ascii_lowercase();
    let name = words.next()?.to_string();
    if words.next().is_some() {
        return None;
    }
    match kind.as_str() {
        "role" => Some(UseStatement::Role(name)),
        "warehouse" => Some(UseStatement::Warehouse(name)),
        "database" => Some(UseStatement::Database(name)),
        "schema" => Some(UseStatement::Schema(name)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "snowflake_test.rs"]
mod tests;
