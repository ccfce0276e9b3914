use tokio_util::sync::CancellationToken;

/// Completes on SIGINT or SIGTERM.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
    Ok(())
}

/// Cancels `cancel` on the first shutdown signal; returns early if it is cancelled otherwise.
pub async fn cancel_on_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {},
        result = wait_for_shutdown_signal() => {
            match result {
                Ok(()) => {
                    log::warn!("Shutdown signal received, ending the day early.");
                    cancel.cancel();
                }
                Err(e) => log::error!("Failed to install signal handlers: {}", e),
            }
        }
    }
}
