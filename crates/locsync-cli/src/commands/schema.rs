use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

pub fn run_schema(out_dir: PathBuf) -> color_eyre::Result<ExitCode> {
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
            tracing::debug!(event = "schema_written", path = %path.display());
        }};
    }
    dump!(locsync_domain::OperationReport, "operation_report.schema.json");
    dump!(locsync_domain::ConsistencyReport, "consistency_report.schema.json");
    println!("schemas written to {}", out_dir.display());
    Ok(ExitCode::SUCCESS)
}
