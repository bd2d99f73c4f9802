//! Telemetry helpers for applications embedding `cubism-rs`.
//!
//! The binding and the headless runtime only emit `tracing` events: context
//! configuration and timer scheduling at `debug`, event dispatch and chart
//! redraws at `trace`, swallowed request failures at `warn`. Nothing is
//! printed until the host installs a subscriber, either its own or the
//! compact one from `init_default_tracing`.

/// Installs a compact fmt subscriber filtered by `RUST_LOG`, or
/// `cubism_rs=info` when the variable is unset.
///
/// `false` means nothing was installed: the `telemetry` feature is off or the
/// host already set a global subscriber.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cubism_rs=info")),
            )
            .with_target(true)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
