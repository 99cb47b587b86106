use std::process::ExitCode;

use color_eyre::eyre::Result;
use locsync_domain::{ConsistencyReport, LanguageStatus, OperationReport, Origin};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::Ctx;

pub fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value)?;
    println!();
    Ok(())
}

fn status_label(status: LanguageStatus, use_color: bool) -> String {
    let text = status.as_str();
    if !use_color {
        return text.to_string();
    }
    match status {
        LanguageStatus::Written => text.green().to_string(),
        LanguageStatus::SkippedDryRun => text.cyan().to_string(),
        LanguageStatus::Unchanged => text.dimmed().to_string(),
        LanguageStatus::Failed => text.red().to_string(),
    }
}

fn origin_label(origin: Origin, use_color: bool) -> String {
    let text = origin.as_str();
    match (origin, use_color) {
        (_, false) => text.to_string(),
        (Origin::Human, true) => text.to_string(),
        (Origin::Ai, true) => text.blue().to_string(),
        (Origin::Fallback, true) => text.yellow().to_string(),
    }
}

pub fn print_operation(report: &OperationReport, ctx: &Ctx) -> Result<()> {
    if ctx.json {
        return print_json(report);
    }
    let c = ctx.use_color;
    if report.dry_run {
        println!("DRY-RUN: no catalog was written");
    }
    if let Some(ex) = &report.extraction {
        println!(
            "scanned {} file(s), found {} key(s)",
            ex.files_scanned, ex.keys_found
        );
        for issue in &ex.failures {
            println!("  skipped {}: {}", issue.path, issue.error);
        }
        for key in &ex.rejected_keys {
            println!("  rejected key `{key}`");
        }
    }
    for lang in &report.languages {
        println!(
            "{:<8} {:<16} {}",
            lang.language,
            status_label(lang.status, c),
            lang.path
        );
        for entry in &lang.entries {
            let mut line = format!(
                "    {} = {:?} [{}]",
                entry.key,
                entry.value,
                origin_label(entry.origin, c)
            );
            if let Some(prev) = &entry.previous {
                line.push_str(&format!(" (was {prev:?})"));
            }
            if let Some(note) = &entry.note {
                line.push_str(&format!(" {note}"));
            }
            println!("{line}");
        }
        for conflict in &lang.conflicts {
            let tag = if c { "conflict".yellow().to_string() } else { "conflict".to_string() };
            println!("    {tag}: {conflict}");
        }
        if let Some(err) = &lang.error {
            let tag = if c { "error".red().to_string() } else { "error".to_string() };
            println!("    {tag}: {err}");
        }
    }
    if !report.keys.is_empty() {
        println!("keys: {}", report.keys.join(", "));
    }
    println!("{}", report.summary);
    Ok(())
}

pub fn print_consistency(report: &ConsistencyReport, ctx: &Ctx) -> Result<()> {
    if ctx.json {
        return print_json(report);
    }
    let c = ctx.use_color;
    for lang in &report.languages {
        let state = match (lang.is_clean(), c) {
            (true, true) => "ok".green().to_string(),
            (true, false) => "ok".to_string(),
            (false, true) => "inconsistent".red().to_string(),
            (false, false) => "inconsistent".to_string(),
        };
        println!("{:<8} {}", lang.language, state);
        if let Some(err) = &lang.error {
            println!("    error: {err}");
        }
        for (label, keys) in [
            ("missing", &lang.missing),
            ("extra", &lang.extra),
            ("conflict", &lang.conflicts),
            ("placeholders", &lang.placeholder_mismatches),
        ] {
            for key in keys {
                println!("    {label}: {key}");
            }
        }
    }
    let dirty = report.languages.iter().filter(|l| !l.is_clean()).count();
    println!(
        "check: {} language(s) compared with `{}`, {} inconsistent",
        report.languages.len(),
        report.default_language,
        dirty
    );
    Ok(())
}
