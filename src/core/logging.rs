//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// sylva::core::logging::init();
/// log::info!("Generator ready");
/// ```
pub fn init() {
    // Tolerate a second call (tests, embedding applications).
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
