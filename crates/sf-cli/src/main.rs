//! snow - deploy native applications and streamlit dashboards, run SQL

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands};
use commands::{app, common, connection, render, sql, streamlit};
use context::CliContext;

/// Crates whose records follow the selected level; everything else stays at warn
const LOG_TARGETS: [&str; 5] = ["snow", "sf_core", "sf_db", "sf_jinja", "sf_deploy"];

/// `RUST_LOG` wins, then `--verbose`, then `[cli.logs] level`, then info
fn init_logging(verbose: bool, configured: Option<&str>) {
    let level = if verbose {
        "debug"
    } else {
        configured.unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",");
        EnvFilter::new(format!("warn,{}", directives))
    });

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut ctx = CliContext::new(&cli.global)?;
    init_logging(cli.global.verbose, ctx.configured_log_level());

    match &cli.command {
        Commands::Connection(args) => connection::execute(&args.command, &mut ctx),
        Commands::Sql(args) => sql::execute(args, &ctx),
        Commands::Render(args) => render::execute(&args.command),
        Commands::App(args) => app::execute(&args.command, &ctx),
        Commands::Streamlit(args) => streamlit::execute(&args.command, &ctx),
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<common::ExitCode>() {
            Some(code) => std::process::ExitCode::from(u8::try_from(code.0).unwrap_or(1)),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::ExitCode::FAILURE
            }
        },
    }
}
