use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancel `shutdown` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown.cancelled() => return,
            received = wait_for_signal() => {
                if !received {
                    return;
                }
            }
        }

        shutdown.cancel();
    })
}

/// Resolves to true once a termination signal arrives, false if signal
/// handlers could not be installed.
#[cfg(unix)]
async fn wait_for_signal() -> bool {
    let mut sigterm = match unix_signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            error!("Failed to install SIGTERM handler: {}", err);
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        received = wait_for_ctrl_c() => received,
        _ = sigterm.recv() => {
            info!("Received SIGTERM, initiating graceful shutdown");
            true
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> bool {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> bool {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            true
        }
        Err(err) => {
            error!("Failed to listen for SIGINT: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handler_exits_when_shutdown_already_requested() {
        let shutdown = CancellationToken::new();
        let handle = spawn_signal_handler(shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("signal handler should stop")
            .unwrap();
    }
}
