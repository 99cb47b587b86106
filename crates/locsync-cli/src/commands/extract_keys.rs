use std::process::ExitCode;

use locsync_services::ExtractRequest;

use crate::report::{exit_code, print_operation};
use crate::Ctx;

pub fn run_extract_keys(
    ctx: &Ctx,
    pattern: Option<String>,
    source: Vec<String>,
    add: bool,
    dry_run: bool,
) -> color_eyre::Result<ExitCode> {
    tracing::debug!(event = "extract_keys_args", pattern = ?pattern, source = ?source, add = add, dry_run = dry_run);
    let config = ctx.load_config()?;
    let req = ExtractRequest {
        pattern,
        source,
        add,
        dry_run,
    };
    let report = locsync_services::extract_keys(&config, &req)?;
    print_operation(&report, ctx)?;
    Ok(exit_code(report.has_failures()))
}
