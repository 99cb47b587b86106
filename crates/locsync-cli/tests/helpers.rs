use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use tempfile::TempDir;

pub const CONFIG: &str = r#"default_language = "en"
languages = ["en", "fr", "de"]
translation_file_path = "locales/{language}.json"
source_patterns = ["src/**/*.js"]
"#;

/// Temp project with `locsync.toml` plus the given files.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("locsync.toml"), CONFIG).unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

/// The binary, run inside `dir` with user-level config and credentials isolated.
pub fn locsync(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("locsync").unwrap();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".user-config"))
        .env("HOME", dir)
        .env("RUST_LOG", "warn")
        .env_remove("LOCSYNC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .arg("--no-color");
    cmd
}

pub fn read(dir: &Path, rel: &str) -> Option<String> {
    fs::read_to_string(dir.join(rel)).ok()
}
