//! Shared utilities for CLI commands

use anyhow::{bail, Result};
use sf_db::QueryResult;
use sf_deploy::{AllowAlwaysPolicy, AskAlwaysPolicy, DenyAlwaysPolicy, DeployError, Policy};
use std::fmt;
use std::io::IsTerminal;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing to show on stderr.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Parse repeated `-D key=value` flags into a template context
pub(crate) fn parse_variables(pairs: &[String]) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut data = serde_json::Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid variable: '{}'. Expected key=value.", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid variable: '{}'. Expected key=value.", pair);
        }
        data.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }
    Ok(data)
}

/// Whether prompts can reach a person
pub(crate) fn is_interactive(requested: bool) -> bool {
    requested || std::io::stdin().is_terminal()
}

/// `--force` allows, an interactive session asks, anything else denies
pub(crate) fn select_policy(force: bool, interactive: bool) -> Box<dyn Policy> {
    if force {
        Box::new(AllowAlwaysPolicy)
    } else if interactive {
        Box::new(AskAlwaysPolicy::new())
    } else {
        Box::new(DenyAlwaysPolicy)
    }
}

/// Turn a declined confirmation into the matching process exit status
pub(crate) fn finish(result: Result<(), DeployError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(DeployError::Aborted { exit_code: 0 }) => Ok(()),
        Err(DeployError::Aborted { exit_code }) => Err(ExitCode(exit_code).into()),
        Err(e) => Err(e.into()),
    }
}

/// Calculate column widths for a table
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Render a left-aligned table with a dashed separator under the header
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths = calculate_column_widths(headers, rows);
    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers.iter().map(|h| h.to_string()).collect()));
    out.push(line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    for row in rows {
        out.push(line(row.clone()));
    }
    out.join("\n")
}

/// Print a formatted table to stdout
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    println!("{}", format_table(headers, rows));
}

/// Rows of a query result as strings, `NULL` for missing values
pub(crate) fn result_cells(result: &QueryResult) -> Vec<Vec<String>> {
    result
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(_, value)| value.unwrap_or("NULL").to_string())
                .collect()
        })
        .collect()
}

/// A query result as an array of row objects
pub(crate) fn result_json(result: &QueryResult) -> serde_json::Value {
    let rows = result
        .rows
        .iter()
        .map(|row| {
            let object = row
                .iter()
                .map(|(column, value)| {
                    let value = value.map_or(serde_json::Value::Null, |v| {
                        serde_json::Value::String(v.to_string())
                    });
                    (column.to_string(), value)
                })
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
