// Build-time metadata from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// One-line description, used as the CLI `about` text.
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// `pagetally 0.1.0`, logged once at startup.
pub fn banner() -> String {
    format!("{NAME} {VERSION}")
}
