//! Native application commands

use anyhow::Result;
use sf_deploy::artifacts::build_bundle;
use sf_deploy::{DeployError, DeployMode, NativeAppManager, RunProcessor, TeardownProcessor};

use crate::cli::{AppCommands, AppRunArgs, AppTeardownArgs};
use crate::commands::common::{finish, is_interactive, select_policy};
use crate::context::CliContext;

/// Execute an app subcommand
pub(crate) fn execute(command: &AppCommands, ctx: &CliContext) -> Result<()> {
    match command {
        AppCommands::Bundle => bundle(ctx),
        AppCommands::Run(args) => run(args, ctx),
        AppCommands::Teardown(args) => teardown(args, ctx),
    }
}

fn bundle(ctx: &CliContext) -> Result<()> {
    let project = ctx.load_project()?;
    let definition = project.native_app()?;
    let deploy_root = project.root.join(&definition.deploy_root);
    build_bundle(&project.root, &deploy_root, &definition.artifacts)?;
    println!("Bundle generated at {}", deploy_root.display());
    Ok(())
}

fn run(args: &AppRunArgs, ctx: &CliContext) -> Result<()> {
    let project = ctx.load_project()?;
    let (connection, session) = ctx.session()?;
    let manager = NativeAppManager::new(&session, &project, &connection)?;
    let mode = DeployMode::from_args(
        &manager.stage_fqn,
        args.version.clone(),
        args.patch,
        args.from_release_directive,
    )?;

    manager.build_bundle()?;

    let interactive = is_interactive(args.interactive);
    let policy = select_policy(args.force, interactive);
    let result = RunProcessor::new(&manager).process(policy.as_ref(), &mode, interactive);
    if matches!(result, Err(DeployError::Aborted { .. })) {
        return finish(result);
    }
    result?;

    println!(
        "Your application object ({}) is now available.",
        manager.app_name
    );
    Ok(())
}

fn teardown(args: &AppTeardownArgs, ctx: &CliContext) -> Result<()> {
    let project = ctx.load_project()?;
    let (connection, session) = ctx.session()?;
    let manager = NativeAppManager::new(&session, &project, &connection)?;

    let policy = select_policy(args.force, is_interactive(args.interactive));
    finish(TeardownProcessor::new(&manager).process(policy.as_ref()))?;
    println!("Teardown complete.");
    Ok(())
}
