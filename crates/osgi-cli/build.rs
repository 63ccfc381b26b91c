use std::process::Command;

fn main() {
    // Set build date
    let build_date = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    println!("cargo:rustc-env=OSGI_DEPS_BUILD_DATE={}", build_date);

    let rustc_version = Command::new(std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string()))
        .arg("--version")
        .output()
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=OSGI_DEPS_RUSTC_VERSION={}", rustc_version);

    println!("cargo:rerun-if-changed=Cargo.toml");
}
