use color_eyre::{eyre::eyre, Result};
use framelink::config::ServerConfig;
use framelink::frame::IntervalClock;
use framelink::host::simulated::DEFAULT_BASE_ADDRESS;
use framelink::{Instance, SimulatedHost};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => ServerConfig::default_path()
            .ok_or_else(|| eyre!("No config path given and no config directory available"))?,
    };
    let config = ServerConfig::load(&config_path).await?;

    // No emulator is linked in, so the binary serves a simulated one
    let host = Arc::new(SimulatedHost::new(
        DEFAULT_BASE_ADDRESS,
        config.simulated_memory_size,
    ));
    let clock = IntervalClock::new(config.frame_rate_hz);

    let instance = Instance::bind(config, host).await?;
    info!(
        "Instance ready at {} watching {} value(s)",
        instance.local_addr(),
        instance.watch_list().len()
    );

    instance.run(clock).await?;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
