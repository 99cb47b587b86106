use std::process::ExitCode;

use crate::report::{exit_code, print_consistency};
use crate::Ctx;

pub fn run_check(ctx: &Ctx) -> color_eyre::Result<ExitCode> {
    let config = ctx.load_config()?;
    let report = locsync_services::check(&config)?;
    print_consistency(&report, ctx)?;
    Ok(exit_code(!report.is_clean()))
}
