use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated working directory with a `.bakery/config.md` and font documents,
/// plus a handle on the built binary.
pub struct TestHarness {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub bakery_binary: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config("---\nspecification: general\nrun:\n  jobs: 2\n---\n\n# Project Config\n")
    }

    /// Creates a harness with custom config content.
    pub fn with_config(config_content: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = dir.path().join(".bakery/config.md");
        fs::create_dir_all(config_path.parent().expect("config has a parent"))
            .expect("Failed to create .bakery dir");
        fs::write(&config_path, config_content).expect("Failed to write config");

        TestHarness {
            dir,
            config_path,
            bakery_binary: PathBuf::from(env!("CARGO_BIN_EXE_bakery")),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a JSON document relative to the harness directory.
    pub fn write_font(&self, relative: &str, attributes: Value) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create font dir");
        }
        fs::write(&path, serde_json::to_string_pretty(&attributes).unwrap())
            .expect("Failed to write font");
        path
    }

    /// Executes the bakery binary with the given arguments in the harness directory.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.bakery_binary)
            .args(args)
            .current_dir(self.path())
            .env_remove("BAKERY_LOG")
            .output()
            .expect("Failed to run bakery")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
