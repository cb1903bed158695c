//! Auth command handlers.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use zwdc_config::Config;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct AuthReport {
    endpoint: String,
    client_id: String,
    username: String,
    state: String,
    checked_at: String,
}

fn detail(r: &AuthReport) -> String {
    format!(
        "Endpoint:   {}\nClient:     {}\nUser:       {}\nState:      {}\nChecked at: {}",
        r.endpoint, r.client_id, r.username, r.state, r.checked_at
    )
}

pub async fn handle(args: &AuthArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Check => {
            let runtime = config.to_runtime()?;
            let manager = util::token_manager(&runtime, global)?;
            manager.ensure_access().await?;

            let report = AuthReport {
                endpoint: runtime.auth.endpoint.to_string(),
                client_id: runtime.auth.client_id.clone(),
                username: runtime.auth.username.clone(),
                state: format!("{:?}", manager.state()),
                checked_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            };
            let out = output::render_single(global.output, &report, detail, |r| r.state.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
