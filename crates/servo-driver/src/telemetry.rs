//! Log subscriber setup for the driver.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_telemetry() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,servo_driver=debug,servo_world=debug".into());

    let json = std::env::var("SERVO_LOG_FORMAT").is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    info!(json, "Telemetry initialized");
    Ok(())
}
