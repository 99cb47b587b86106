use std::process::ExitCode;

use locsync_services::AddKeyRequest;

use crate::report::{exit_code, print_operation};
use crate::Ctx;

pub fn run_add_key(
    ctx: &Ctx,
    key: String,
    value: Option<String>,
    translate: bool,
    force: bool,
    dry_run: bool,
) -> color_eyre::Result<ExitCode> {
    tracing::debug!(event = "add_key_args", key = %key, value = ?value, translate = translate, force = force, dry_run = dry_run);
    let config = ctx.load_config()?;
    let translator = super::translator_for(&config, translate)?;
    let req = AddKeyRequest {
        key,
        value,
        translate,
        force,
        dry_run,
    };
    let report = locsync_services::add_key(&config, &req, translator.as_ref())?;
    print_operation(&report, ctx)?;
    Ok(exit_code(report.has_failures()))
}
