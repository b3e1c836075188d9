//! Turns SIGINT/SIGTERM into the shutdown request the controller listens for.

use std::future::Future;

use log::{info, warn};
use tokio::sync::watch;

/// Installs the signal handlers and returns a receiver that flips to `true`
/// once one of them fires. Must be called from within a tokio runtime.
pub fn forward_shutdown_signals() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(forward(shutdown_signal(), tx));
    rx
}

/// Waits for `signal`, then requests shutdown through `tx`.
pub async fn forward<S: Future<Output = ()>>(signal: S, tx: watch::Sender<bool>) {
    signal.await;
    info!("Signal received, shutting down");
    tx.send_replace(true);
}

// Handlers are registered here, before the returned future is first polled.
#[cfg(unix)]
fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    use tokio::signal::unix::{signal, SignalKind};

    let terminate = signal(SignalKind::terminate());
    let interrupt = signal(SignalKind::interrupt());
    async move {
        match (terminate, interrupt) {
            (Ok(mut terminate), Ok(mut interrupt)) => {
                tokio::select! {
                    _ = interrupt.recv() => {}
                    _ = terminate.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Unable to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

#[cfg(not(unix))]
fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn signal_requests_shutdown() {
        let (fire, fired) = oneshot::channel::<()>();
        let (tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(forward(
            async move {
                let _ = fired.await;
            },
            tx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!*rx.borrow());

        fire.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|stop| *stop))
            .await
            .expect("shutdown was not requested")
            .unwrap();
        task.await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_requests_shutdown() {
        let mut rx = forward_shutdown_signals();

        let sent = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(sent.success());

        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|stop| *stop))
            .await
            .expect("SIGTERM did not request shutdown")
            .unwrap();
    }
}
