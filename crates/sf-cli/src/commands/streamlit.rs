//! Streamlit commands

use anyhow::Result;
use sf_deploy::StreamlitDeployer;

use crate::cli::{StreamlitCommands, StreamlitDeployArgs};
use crate::context::CliContext;

/// Execute a streamlit subcommand
pub(crate) fn execute(command: &StreamlitCommands, ctx: &CliContext) -> Result<()> {
    match command {
        StreamlitCommands::Deploy(args) => deploy(args, ctx),
    }
}

fn deploy(args: &StreamlitDeployArgs, ctx: &CliContext) -> Result<()> {
    let project = ctx.load_project()?;
    let (connection, session) = ctx.session()?;
    let deployer = StreamlitDeployer::new(&session, &project, &connection)?;
    let name = deployer.deploy(args.replace, args.experimental)?;
    println!("Streamlit successfully deployed and available under {}", name);
    Ok(())
}
