use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod report;

#[derive(Parser)]
#[command(name = "locsync", version, about = "Keep translation catalogs in sync with the source code")]
struct Cli {
    /// Config file (default: ./locsync.toml, then ./locsync.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Also write debug logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a key to every language catalog
    AddKey {
        /// Dotted key path, e.g. `welcome.title`
        key: String,
        /// Default-language value (defaults to the key itself)
        value: Option<String>,
        /// Machine-translate the value for the other languages
        #[arg(long)]
        translate: bool,
        /// Replace existing values in the other languages
        #[arg(long)]
        force: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Find keys used in source files that the default catalog lacks
    ExtractKeys {
        /// Key regex; capture group 1 is the key
        #[arg(long)]
        pattern: Option<String>,
        /// Source glob, replaces the configured ones (repeatable)
        #[arg(long)]
        source: Vec<String>,
        /// Write missing keys into the default catalog
        #[arg(long)]
        add: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Fill every language with the keys of the default catalog
    #[command(visible_alias = "translate-all")]
    Sync {
        /// Only this language
        #[arg(long)]
        lang: Option<String>,
        /// Re-translate keys that already have a value
        #[arg(long)]
        force: bool,
        /// Copy default values instead of calling the provider
        #[arg(long)]
        no_translate: bool,
        #[arg(long)]
        dry_run: bool,
    },

    /// Report missing, extra and mismatched keys per language
    Check,

    /// Dump JSON schemas of the report formats
    Schema {
        #[arg(long, default_value = "./docs/schemas")]
        out_dir: PathBuf,
    },
}

/// Settings shared by every command.
pub struct Ctx {
    pub config: Option<PathBuf>,
    pub json: bool,
    pub use_color: bool,
}

impl Ctx {
    pub fn load_config(&self) -> Result<locsync_config::SyncConfig> {
        let config = locsync_config::load_config(self.config.as_deref())?;
        debug!(event = "config_loaded", root = %config.root.display(), languages = ?config.languages);
        Ok(config)
    }
}

trait Runnable {
    fn run(self, ctx: &Ctx) -> Result<ExitCode>;
}

impl Runnable for Commands {
    fn run(self, ctx: &Ctx) -> Result<ExitCode> {
        let cmd_name = format!("{:?}", self);
        info!(event = "command_start", cmd = %cmd_name);

        let result = match self {
            Commands::AddKey {
                key,
                value,
                translate,
                force,
                dry_run,
            } => commands::add_key::run_add_key(ctx, key, value, translate, force, dry_run),
            Commands::ExtractKeys {
                pattern,
                source,
                add,
                dry_run,
            } => commands::extract_keys::run_extract_keys(ctx, pattern, source, add, dry_run),
            Commands::Sync {
                lang,
                force,
                no_translate,
                dry_run,
            } => commands::sync::run_sync(ctx, lang, force, !no_translate, dry_run),
            Commands::Check => commands::check::run_check(ctx),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        };

        match &result {
            Ok(code) => info!(event = "command_done", cmd = %cmd_name, exit = ?code),
            Err(e) => error!(event = "command_failed", cmd = %cmd_name, error = %e),
        }
        result
    }
}

fn init_tracing(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, "locsync.log"));
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_ref());

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();
    let ctx = Ctx {
        config: cli.config,
        json: cli.format == "json",
        use_color,
    };
    cli.cmd.run(&ctx)
}
