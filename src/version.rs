// Build identity, taken from the package metadata at compile time.
// TSDASH_BUILD_VERSION can be set by packaging scripts to inject a git
// describe string.

pub fn build_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

pub fn build_version() -> &'static str {
    option_env!("TSDASH_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
