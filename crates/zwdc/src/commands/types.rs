//! Device-type command handlers.

use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use zwdc_api::DeviceType;
use zwdc_config::Config;
use zwdc_core::devicetypes::{ATTRIBUTE_TYPE_MAPPING_KEY, FALLBACK_KEY};
use zwdc_core::{CoreError, FallbackStore, TypeSource, build_definition};

use crate::cli::{GlobalOpts, TypesArgs, TypesCommand};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceTypeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mapping Keys")]
    keys: String,
    #[tabled(rename = "Services")]
    services: usize,
}

fn row(dt: &DeviceType) -> DeviceTypeRow {
    DeviceTypeRow {
        id: dt.id.clone(),
        name: dt.name.clone(),
        keys: dt
            .attribute_values(ATTRIBUTE_TYPE_MAPPING_KEY)
            .collect::<Vec<_>>()
            .join(", "),
        services: dt.services.len(),
    }
}

#[derive(Serialize)]
struct Resolution {
    key: String,
    type_id: String,
    source: String,
}

fn resolution_detail(r: &Resolution) -> String {
    format!("{} -> {} ({})", r.key, r.type_id, r.source)
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: &TypesArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.command {
        TypesCommand::List { fallback: true } => {
            let store = FallbackStore::open(&config.fallback_file)?;
            let types: Vec<DeviceType> = serde_json::from_value(store.get(FALLBACK_KEY)?)?;
            print_types(&types, global)
        }

        TypesCommand::List { fallback: false } => {
            let (_, cache) = util::device_type_cache(config, global)?;
            let types = cache.list_types().await?;
            if cache.used_fallback() {
                warn!("catalog unreachable, showing fallback data");
            }
            print_types(&types, global)
        }

        TypesCommand::Resolve { key } => {
            let resolution = if let Some(type_id) = config.device_type_mapping.get(key) {
                Resolution {
                    key: key.clone(),
                    type_id: type_id.clone(),
                    source: TypeSource::StaticMapping.to_string(),
                }
            } else {
                let (_, cache) = util::device_type_cache(config, global)?;
                let found = cache.resolve(key).await?;
                Resolution {
                    key: key.clone(),
                    type_id: found.type_id,
                    source: source_of(found.used_fallback).to_string(),
                }
            };
            print_resolution(&resolution, global)
        }

        TypesCommand::Definition { node_file } => {
            let node = util::read_node(node_file)?;
            let runtime = config.to_runtime()?;
            let definition = build_definition(&node, &runtime.connector.definition);
            let out = output::render_single(
                global.output,
                &definition,
                |d| serde_json::to_string_pretty(d).unwrap_or_default(),
                |d| d.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TypesCommand::Create { node_file } => {
            let node = util::read_node(node_file)?;
            let key = node.type_mapping_key();
            let (runtime, cache) = util::device_type_cache(config, global)?;

            let resolution = match cache.resolve(&key).await {
                Ok(found) => Resolution {
                    key,
                    type_id: found.type_id,
                    source: source_of(found.used_fallback).to_string(),
                },
                Err(CoreError::NoMatchingDeviceType {
                    used_fallback: true,
                    ..
                }) => {
                    return Err(CliError::ConnectionFailed {
                        message: "catalog unreachable; refusing to create a type from fallback data"
                            .into(),
                    });
                }
                Err(e) if e.is_no_match() => {
                    let definition = build_definition(&node, &runtime.connector.definition);
                    let created = cache.create_type(&key, &definition).await?;
                    Resolution {
                        key,
                        type_id: created.id,
                        source: TypeSource::Created.to_string(),
                    }
                }
                Err(e) => return Err(e.into()),
            };
            print_resolution(&resolution, global)
        }
    }
}

fn source_of(used_fallback: bool) -> TypeSource {
    if used_fallback {
        TypeSource::Fallback
    } else {
        TypeSource::CacheHit
    }
}

fn print_types(types: &[DeviceType], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(global.output, types, row, |dt| dt.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_resolution(resolution: &Resolution, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, resolution, resolution_detail, |r| {
        r.type_id.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
