//! SQL command implementation

use anyhow::{bail, Context, Result};
use sf_core::sql_utils::split_statements;
use sf_db::{QueryResult, Session};
use std::fs;
use std::io::Read;

use crate::cli::{OutputFormat, SqlArgs};
use crate::commands::common::{parse_variables, print_table, result_cells, result_json};
use crate::context::CliContext;

/// Execute the sql command
pub(crate) fn execute(args: &SqlArgs, ctx: &CliContext) -> Result<()> {
    let text = read_input(args)?;
    let statements = prepare_statements(&text, &args.variables)?;
    if statements.is_empty() {
        bail!("No SQL statements to execute");
    }

    let (_, session) = ctx.session()?;
    log::debug!(
        "Executing {} statement(s) via {}",
        statements.len(),
        session.backend_name()
    );
    let batch = statements
        .iter()
        .map(|s| format!("{};", s))
        .collect::<Vec<_>>()
        .join("\n");
    let results = session.execute_many(&batch)?;
    print_results(&results, args.format)
}

fn read_input(args: &SqlArgs) -> Result<String> {
    if let Some(query) = &args.query {
        return Ok(query.clone());
    }
    if let Some(file) = &args.filename {
        return fs::read_to_string(file).with_context(|| format!("Failed to read {}", file));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read SQL from stdin")?;
    Ok(buf)
}

/// Render client-side variables, then split into statements without comments
pub(crate) fn prepare_statements(text: &str, variables: &[String]) -> Result<Vec<String>> {
    let rendered = if variables.is_empty() {
        text.to_string()
    } else {
        let data = parse_variables(variables)?;
        let transpiled = sf_jinja::transpile_snowsql_templates(text);
        sf_jinja::render_cli(&transpiled, &data)?
    };
    Ok(split_statements(&rendered, true)?)
}

fn print_results(results: &[QueryResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = match results {
                [single] => result_json(single),
                many => serde_json::Value::Array(many.iter().map(result_json).collect()),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            for result in results {
                if result.columns.is_empty() {
                    continue;
                }
                let headers: Vec<&str> = result.columns.iter().map(String::as_str).collect();
                print_table(&headers, &result_cells(result));
                println!();
            }
        }
    }
    Ok(())
}
