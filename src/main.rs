use color_eyre::{eyre::eyre, Result};
use padbind::binding::{ConfiguratorHandle, Notification};
use padbind::config::ConfiguratorConfig;
use padbind::controller::CollectorHandle;
use padbind::persistence::{BindingStore, PersistenceWorker};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(ConfiguratorConfig::default_path);
    let config = ConfiguratorConfig::load(&config_path)
        .await
        .map_err(|e| eyre!("Failed to load config: {}", e))?;

    let persistence = PersistenceWorker::spawn(BindingStore::new(BindingStore::default_location()));

    let (notification_tx, mut notification_rx) = mpsc::channel(100);
    let mut configurator = ConfiguratorHandle::spawn(
        config.settings(),
        config.buttons.clone(),
        config.axes.clone(),
        notification_tx,
    );

    let mut collector = CollectorHandle::spawn(
        Some(config.collector_settings()),
        configurator.get_sender(),
        persistence.get_sender(),
    )
    .map_err(|e| eyre!("Failed to spawn collector: {}", e))?;

    info!("Waiting for controllers, press Ctrl+C to quit");
    loop {
        tokio::select! {
            notification = notification_rx.recv() => match notification {
                Some(notification) => present(&notification),
                None => break,
            },
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down");
    if let Err(e) = collector.shutdown().await {
        warn!("Collector shutdown failed: {}", e);
    }
    if let Err(e) = configurator.shutdown().await {
        warn!("Configurator shutdown failed: {}", e);
    }
    drop(configurator);
    persistence.shutdown().await;

    Ok(())
}

fn present(notification: &Notification) {
    match notification {
        Notification::Error { .. } | Notification::Aborted { .. } => warn!("{}", notification),
        _ => info!("{}", notification),
    }
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
        .pretty()
        .init();
}
