pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = match option_env!("BUILD_COMMIT") {
    Some(c) => c,
    None => "unknown",
};

/// Version string including the commit the binary was built from.
pub fn version_string() -> String {
    format!("{} (commit: {})", VERSION, COMMIT)
}

/// User agent sent to external sources when none is configured.
pub fn default_user_agent() -> String {
    format!("gamescout/{}", VERSION)
}
