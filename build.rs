use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=GIT_VERSION");

    let version = std::env::var("GIT_VERSION")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(describe_head)
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_VERSION={}", version);
}

/// `git describe` of the checkout, when building from one.
fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
