use std::process::Command;

/// Run a command and capture its trimmed stdout, falling back to "unknown".
fn command_output(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn main() {
    // Release builds set these explicitly; local builds ask git and date.
    let git_sha =
        std::env::var("GIT_SHA").unwrap_or_else(|_| command_output("git", &["rev-parse", "--short", "HEAD"]));
    let build_date =
        std::env::var("BUILD_DATE").unwrap_or_else(|_| command_output("date", &["+%Y-%m-%d"]));

    println!("cargo:rustc-env=GIT_SHA={}", git_sha);
    println!("cargo:rustc-env=BUILD_DATE={}", build_date);
    println!("cargo:rerun-if-env-changed=GIT_SHA");
    println!("cargo:rerun-if-env-changed=BUILD_DATE");
}
