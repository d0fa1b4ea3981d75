//! Connection profile commands

use anyhow::{Context, Result};
use sf_core::ConnectionConfig;
use sf_db::{current_role, Session, SqlApiSession};

use crate::cli::{
    ConnectionAddArgs, ConnectionCommands, ConnectionSetDefaultArgs, ConnectionTestArgs,
};
use crate::commands::common::print_table;
use crate::context::CliContext;

/// Execute a connection subcommand
pub(crate) fn execute(command: &ConnectionCommands, ctx: &mut CliContext) -> Result<()> {
    match command {
        ConnectionCommands::List => list(ctx),
        ConnectionCommands::Add(args) => add(args, ctx),
        ConnectionCommands::SetDefault(args) => set_default(args, ctx),
        ConnectionCommands::Test(args) => test_connection(args, ctx),
    }
}

/// Table rows for every profile: name, masked parameters, default marker
pub(crate) fn connection_rows(ctx: &CliContext) -> Vec<Vec<String>> {
    let default_name = ctx.config.resolve_connection_name(None);
    ctx.config
        .connections
        .iter()
        .map(|(name, connection)| {
            let parameters = connection
                .redacted_entries()
                .into_iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                name.clone(),
                parameters,
                (name == default_name).to_string(),
            ]
        })
        .collect()
}

fn list(ctx: &CliContext) -> Result<()> {
    let rows = connection_rows(ctx);
    if rows.is_empty() {
        println!("No connections configured in {}", ctx.config_path.display());
        return Ok(());
    }
    print_table(&["CONNECTION_NAME", "PARAMETERS", "IS_DEFAULT"], &rows);
    Ok(())
}

fn add(args: &ConnectionAddArgs, ctx: &mut CliContext) -> Result<()> {
    let connection = ConnectionConfig {
        account: Some(args.account.clone()),
        user: args.user.clone(),
        host: args.host.clone(),
        port: args.port,
        database: args.database.clone(),
        schema: args.schema.clone(),
        warehouse: args.warehouse.clone(),
        role: args.role.clone(),
        authenticator: args.authenticator.clone(),
        token: args.token.clone(),
        token_type: args.token_type.clone(),
        ..Default::default()
    };
    ctx.config
        .add_connection(&args.connection_name, connection, &ctx.config_path)?;
    ctx.config
        .save(&ctx.config_path)
        .context("Failed to write connection")?;
    println!(
        "Wrote new connection {} to {}",
        args.connection_name,
        ctx.config_path.display()
    );
    Ok(())
}

fn set_default(args: &ConnectionSetDefaultArgs, ctx: &mut CliContext) -> Result<()> {
    ctx.config.set_default_connection(&args.name)?;
    ctx.config.save(&ctx.config_path)?;
    println!("Default connection set to: {}", args.name);
    Ok(())
}

fn test_connection(args: &ConnectionTestArgs, ctx: &CliContext) -> Result<()> {
    let (name, connection) = ctx.named_connection(args.connection_name.as_deref())?;
    let session =
        SqlApiSession::from_connection(&connection).context("Failed to open a session")?;
    let rows = check_connection(&session, &name, &connection)?;
    print_table(&["KEY", "VALUE"], &rows);
    Ok(())
}

/// Run a statement over `session` and describe the masked profile it used
pub(crate) fn check_connection(
    session: &dyn Session,
    name: &str,
    connection: &ConnectionConfig,
) -> Result<Vec<Vec<String>>> {
    let role = current_role(session)
        .with_context(|| format!("Connection {} failed", name))?;

    let mut rows = vec![vec!["connection_name".to_string(), name.to_string()]];
    rows.extend(
        connection
            .redacted_entries()
            .into_iter()
            .map(|(key, value)| vec![key.to_string(), value]),
    );
    rows.push(vec!["current_role".to_string(), role]);
    rows.push(vec!["status".to_string(), "OK".to_string()]);
    Ok(rows)
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
