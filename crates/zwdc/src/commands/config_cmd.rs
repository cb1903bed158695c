//! Config subcommand handlers.

use std::fmt::Write;

use zwdc_config::{Config, RuntimeConfig};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn summary(runtime: &RuntimeConfig) -> String {
    let c = &runtime.connector;
    let mut out = String::new();
    let _ = writeln!(out, "dialect            {}", runtime.dialect);
    let _ = writeln!(out, "device id prefix   {}", c.device_id_prefix);
    let _ = writeln!(out, "repository         {}", runtime.device_repository_url);
    let _ = writeln!(out, "manager            {}", runtime.device_manager_url);
    let _ = writeln!(out, "auth endpoint      {}", runtime.auth.endpoint);
    let _ = writeln!(
        out,
        "cache              min {:?}, max {:?}",
        c.cache.min_cache_duration, c.cache.max_cache_duration
    );
    let _ = writeln!(out, "fallback file      {}", c.fallback_file.display());
    match c.update_period {
        Some(period) => {
            let _ = writeln!(out, "update period      {period:?}");
        }
        None => {
            let _ = writeln!(out, "update period      disabled");
        }
    }
    let _ = writeln!(out, "missing devices    {}", c.registry.missing_devices);
    let _ = writeln!(out, "delete husks       {}", c.registry.delete_husks);
    let _ = writeln!(out, "create types       {}", c.create_missing_device_types);
    let _ = writeln!(out, "static mappings    {}", c.device_type_mapping.len());
    let _ = write!(out, "node overwrites    {}", c.node_device_type_overwrite.len());
    out
}

pub fn handle(args: &ConfigArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match args.command {
        ConfigCommand::Show { toml: true } => config.to_toml()?,
        ConfigCommand::Show { toml: false } => config.to_json()?,
        ConfigCommand::Check => summary(&config.to_runtime()?),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
