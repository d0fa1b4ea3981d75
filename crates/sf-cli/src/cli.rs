//! CLI argument definitions using clap derive API

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

/// snow - deploy native applications and streamlit dashboards, run SQL
#[derive(Parser, Debug)]
#[command(name = "snow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the project directory containing snowflake.yml
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project: String,

    /// Override the config.toml location
    #[arg(long, global = true, env = "SNOWFLAKE_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Connection profile to use instead of the default one
    #[arg(short = 'c', long, global = true, env = "SNOWFLAKE_CONNECTION")]
    pub connection: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage connection profiles
    Connection(ConnectionArgs),

    /// Execute SQL against the platform
    Sql(SqlArgs),

    /// Render templates locally
    Render(RenderArgs),

    /// Manage native application packages and applications
    App(AppArgs),

    /// Deploy streamlit dashboards
    Streamlit(StreamlitArgs),
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    #[command(subcommand)]
    pub command: ConnectionCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConnectionCommands {
    /// List configured connections
    List,

    /// Add a new connection profile to config.toml
    Add(ConnectionAddArgs),

    /// Make a connection the default one
    SetDefault(ConnectionSetDefaultArgs),

    /// Check that a connection can run a statement
    Test(ConnectionTestArgs),
}

/// Arguments for `connection add`
#[derive(Args, Debug)]
pub struct ConnectionAddArgs {
    /// Name of the new connection
    #[arg(short = 'n', long)]
    pub connection_name: String,

    /// Account identifier
    #[arg(short, long)]
    pub account: String,

    /// User name
    #[arg(short, long)]
    pub user: Option<String>,

    /// Host, when it differs from `<account>.snowflakecomputing.com`
    #[arg(long)]
    pub host: Option<String>,

    /// Port
    #[arg(long)]
    pub port: Option<u16>,

    /// Default database
    #[arg(short, long)]
    pub database: Option<String>,

    /// Default schema
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Default warehouse
    #[arg(short, long)]
    pub warehouse: Option<String>,

    /// Default role
    #[arg(short, long)]
    pub role: Option<String>,

    /// Authenticator name
    #[arg(long)]
    pub authenticator: Option<String>,

    /// Access token for the SQL API
    #[arg(long)]
    pub token: Option<String>,

    /// Token type (OAUTH, PROGRAMMATIC_ACCESS_TOKEN, ...)
    #[arg(long)]
    pub token_type: Option<String>,
}

/// Arguments for `connection set-default`
#[derive(Args, Debug)]
pub struct ConnectionSetDefaultArgs {
    /// Connection to use by default
    pub name: String,
}

/// Arguments for `connection test`
#[derive(Args, Debug)]
pub struct ConnectionTestArgs {
    /// Connection to check (defaults to --connection, then the default one)
    #[arg(short = 'n', long)]
    pub connection_name: Option<String>,
}

/// Arguments for the sql command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["query", "filename", "stdin"])))]
pub struct SqlArgs {
    /// Query to execute
    #[arg(short, long)]
    pub query: Option<String>,

    /// File with SQL to execute
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Read SQL from standard input
    #[arg(short = 'i', long = "stdin")]
    pub stdin: bool,

    /// Template variable as key=value (repeatable)
    #[arg(short = 'D', long = "variable")]
    pub variables: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Result output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// JSON rows
    Json,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(subcommand)]
    pub command: RenderCommands,
}

#[derive(Subcommand, Debug)]
pub enum RenderCommands {
    /// Render a Jinja template file
    Template(RenderTemplateArgs),
}

/// Arguments for `render template`
#[derive(Args, Debug)]
pub struct RenderTemplateArgs {
    /// Template file
    pub template_path: String,

    /// Template variable as key=value (repeatable)
    #[arg(short = 'D', long = "variable")]
    pub variables: Vec<String>,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output_file: Option<String>,
}

#[derive(Args, Debug)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: AppCommands,
}

#[derive(Subcommand, Debug)]
pub enum AppCommands {
    /// Copy the project artifacts into the deploy root
    Bundle,

    /// Create or upgrade the application package and application
    Run(AppRunArgs),

    /// Drop the application and its package
    Teardown(AppTeardownArgs),
}

/// Arguments for `app run`
#[derive(Args, Debug)]
pub struct AppRunArgs {
    /// Create or upgrade from an existing version of the package
    #[arg(long)]
    pub version: Option<String>,

    /// Patch of `--version` to use
    #[arg(long, requires = "version")]
    pub patch: Option<u32>,

    /// Create or upgrade from the package's release directive
    #[arg(long, conflicts_with = "version")]
    pub from_release_directive: bool,

    /// Prompt for confirmation even when stdin is not a terminal
    #[arg(long)]
    pub interactive: bool,

    /// Answer yes to every confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `app teardown`
#[derive(Args, Debug)]
pub struct AppTeardownArgs {
    /// Prompt for confirmation even when stdin is not a terminal
    #[arg(long)]
    pub interactive: bool,

    /// Drop objects without asking
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct StreamlitArgs {
    #[command(subcommand)]
    pub command: StreamlitCommands,
}

#[derive(Subcommand, Debug)]
pub enum StreamlitCommands {
    /// Upload the dashboard files and create the streamlit object
    Deploy(StreamlitDeployArgs),
}

/// Arguments for `streamlit deploy`
#[derive(Args, Debug)]
pub struct StreamlitDeployArgs {
    /// Replace the streamlit object if it exists
    #[arg(long)]
    pub replace: bool,

    /// Store the files in the object's embedded stage
    #[arg(long)]
    pub experimental: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
