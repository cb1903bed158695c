//! Command dispatch and handler modules.

pub mod auth;
pub mod config_cmd;
pub mod local_id;
pub mod types;
pub mod util;

use zwdc_config::Config;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a command that needs the connector configuration.
pub async fn dispatch(cmd: &Command, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Types(args) => types::handle(args, config, global).await,
        Command::Auth(args) => auth::handle(args, config, global).await,
        Command::Config(args) => config_cmd::handle(args, config, global),
        Command::LocalId(args) => local_id::handle(args, global),
    }
}
