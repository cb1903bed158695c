//! local-id command handlers.

use serde::Serialize;

use zwdc_core::local_id;

use crate::cli::{GlobalOpts, LocalIdArgs, LocalIdCommand};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct LocalIdPair {
    raw: String,
    encoded: String,
}

pub fn handle(args: &LocalIdArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (pair, wanted_encoded) = match &args.command {
        LocalIdCommand::Encode { raw } => (
            LocalIdPair {
                raw: raw.clone(),
                encoded: local_id::encode(raw),
            },
            true,
        ),
        LocalIdCommand::Decode { encoded } => (
            LocalIdPair {
                raw: local_id::decode(encoded),
                encoded: encoded.clone(),
            },
            false,
        ),
    };

    let pick = |p: &LocalIdPair| {
        if wanted_encoded {
            p.encoded.clone()
        } else {
            p.raw.clone()
        }
    };
    let out = output::render_single(global.output, &pair, pick, pick)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
