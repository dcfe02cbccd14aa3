//! Version strings for `--version`.
//!
//! Release builds can bake in a git revision by setting `COREFORK_GIT_REV`
//! at compile time.

use std::sync::LazyLock;

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git revision baked in at build time (empty if not set).
pub const GIT_REV: &str = match option_env!("COREFORK_GIT_REV") {
    Some(rev) => rev,
    None => "",
};

static LONG_VERSION: LazyLock<String> = LazyLock::new(|| {
    let mut version = if GIT_REV.is_empty() {
        PKG_VERSION.to_string()
    } else {
        format!("{} ({})", PKG_VERSION, GIT_REV)
    };
    version.push_str(&format!(
        "\nplatform: {}-{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    ));
    version
});

/// Multi-line version for `--version`, including revision and platform.
pub fn long_version() -> &'static str {
    LONG_VERSION.as_str()
}
