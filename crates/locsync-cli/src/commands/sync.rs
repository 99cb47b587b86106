use std::process::ExitCode;

use locsync_services::SyncAllRequest;

use crate::report::{exit_code, print_operation};
use crate::Ctx;

pub fn run_sync(
    ctx: &Ctx,
    lang: Option<String>,
    force: bool,
    translate: bool,
    dry_run: bool,
) -> color_eyre::Result<ExitCode> {
    tracing::debug!(event = "sync_args", lang = ?lang, force = force, translate = translate, dry_run = dry_run);
    let config = ctx.load_config()?;
    let translator = super::translator_for(&config, translate)?;
    let req = SyncAllRequest {
        target_language: lang,
        force,
        translate,
        dry_run,
    };
    let report = locsync_services::sync_all(&config, &req, translator.as_ref())?;
    print_operation(&report, ctx)?;
    Ok(exit_code(report.has_failures()))
}
