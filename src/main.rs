use bookitnow_announcer::command::HostCommand;
use bookitnow_announcer::config::AppConfig;
use bookitnow_announcer::DeviceAnnouncer;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = AppConfig::resolve_path(std::env::args_os().nth(1).map(PathBuf::from));
    let config = AppConfig::load(&config_path).await?;

    info!("Starting Book-it-now announcer for {}", config.mqtt);
    let announcer = DeviceAnnouncer::connect(&config.mqtt).await;

    run_command_loop(&announcer).await?;

    announcer.shutdown(config.host.offline_on_exit).await;
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
        .pretty()
        .init();
}

/// Feeds stdin commands into the announcer until ctrl-c.
///
/// When stdin closes (detached service) the announcer keeps its session and the
/// loop only waits for ctrl-c.
async fn run_command_loop(announcer: &DeviceAnnouncer) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal.map_err(|e| eyre!("Failed to listen for ctrl-c: {}", e))?;
                info!("Received ctrl-c, shutting down");
                break;
            }
            line = lines.next_line(), if stdin_open => {
                let line = line.map_err(|e| eyre!("Failed to read stdin: {}", e))?;
                let Some(line) = line else {
                    info!("stdin closed, waiting for ctrl-c");
                    stdin_open = false;
                    continue;
                };

                match HostCommand::parse(&line) {
                    Ok(Some(HostCommand::Guests(guests_today))) => {
                        info!("Guests today: {}", guests_today);
                        announcer.update_state(guests_today).await;
                    }
                    Ok(Some(HostCommand::Send { topic, message })) => {
                        announcer.send_message(&topic, &message).await;
                    }
                    Ok(Some(HostCommand::Status)) => {
                        let status = announcer.status();
                        info!(
                            "client={} state={:?} sent={} last_activity={:?} last_error={:?}",
                            announcer.client_id(),
                            status.connection_state,
                            status.messages_sent,
                            status.last_activity,
                            status.last_error()
                        );
                    }
                    Ok(None) => {}
                    Err(e) => warn!("{}", e),
                }
            }
        }
    }
    Ok(())
}
