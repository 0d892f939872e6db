use std::fs;

/// Cached entries are tagged with the crate version by default, so the
/// VERSION file and Cargo.toml have to agree before anything is built.
fn check_version_file(path: &str) -> Result<(), String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {} (expected the crate version)", path, e))?;
    let declared = contents.trim();
    let package = env!("CARGO_PKG_VERSION");

    if declared == package {
        Ok(())
    } else {
        Err(format!(
            "{} says {} but Cargo.toml says {}; cache entries would carry the wrong version tag",
            path, declared, package
        ))
    }
}

fn main() {
    println!("cargo:rerun-if-changed=VERSION");
    if let Err(msg) = check_version_file("VERSION") {
        panic!("\n\nVERSION MISMATCH: {}\n\n", msg);
    }
}
