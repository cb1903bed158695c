//! Clap derive structures for the `zwdc` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// zwdc -- inspect and exercise the Z-Wave connector's catalog side
#[derive(Debug, Parser)]
#[command(
    name = "zwdc",
    version,
    about = "Z-Wave connector tooling: device-type catalog, auth and local ids",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Connector configuration file (.json or .toml)
    #[arg(
        long,
        short = 'c',
        env = "ZWDC_CONFIG",
        default_value = "config.json",
        global = true
    )]
    pub config: PathBuf,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Custom CA certificate (PEM) for the auth and catalog endpoints
    #[arg(long, global = true, conflicts_with = "insecure")]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    pub timeout: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query, resolve and create catalog device types
    #[command(alias = "t")]
    Types(TypesArgs),

    /// Check the configured catalog credentials
    Auth(AuthArgs),

    /// Escape and unescape ids used as gateway topic segments
    #[command(name = "local-id", alias = "lid")]
    LocalId(LocalIdArgs),

    /// Show or validate the effective configuration
    Config(ConfigArgs),
}

// ── types ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TypesArgs {
    #[command(subcommand)]
    pub command: TypesCommand,
}

#[derive(Debug, Subcommand)]
pub enum TypesCommand {
    /// List the integration's device types
    #[command(alias = "ls")]
    List {
        /// Read the fallback file instead of the catalog
        #[arg(long)]
        fallback: bool,
    },

    /// Resolve a type mapping key (manufacturerId.productType.productId)
    Resolve {
        /// Type mapping key, e.g. 0x0002.0x0005.0x0175
        key: String,
    },

    /// Print the definition that would be created for a node
    Definition {
        /// Node description as JSON (DeviceInfo shape)
        node_file: PathBuf,
    },

    /// Create the device type for a node unless the catalog already has one
    Create {
        /// Node description as JSON (DeviceInfo shape)
        node_file: PathBuf,
    },
}

// ── auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in with the configured credentials and report the token state
    Check,
}

// ── local-id ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LocalIdArgs {
    #[command(subcommand)]
    pub command: LocalIdCommand,
}

#[derive(Debug, Subcommand)]
pub enum LocalIdCommand {
    /// Percent-escape %, +, # and /
    Encode { raw: String },
    /// Reverse `encode`
    Decode { encoded: String },
}

// ── config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (secrets masked)
    Show {
        /// Render as TOML instead of JSON
        #[arg(long)]
        toml: bool,
    },
    /// Validate the configuration and summarize the runtime settings
    Check,
}
