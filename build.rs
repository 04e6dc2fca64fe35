//! Build script for gym-desk
//! Records build metadata picked up by the startup log line

use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=frontend");
    println!("cargo:rerun-if-env-changed=GIT_COMMIT");

    // An explicit GIT_COMMIT from CI wins over asking git
    if std::env::var("GIT_COMMIT").is_err() && Path::new(".git").exists() {
        if let Ok(output) = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output() {
            if output.status.success() {
                let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
                println!("cargo:rustc-env=GIT_COMMIT={}", commit);
            }
        }
    }
}
