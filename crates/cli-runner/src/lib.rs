//! Runs one CLI command to completion on a fresh tokio runtime, cancelling it on SIGINT or
//! SIGTERM.

use std::{future::Future, time::Duration};

use kestrel_primitives::CancellationToken;
use tracing::{debug, warn};

/// Grace period for a cancelled command to unwind before the runtime is torn down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handed to every command; fires when the user interrupts the process.
#[derive(Clone, Debug, Default)]
pub struct CliContext {
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub struct CliRunner;

impl CliRunner {
    /// Execute the command produced by `command` until it finishes.
    ///
    /// On a shutdown signal the context token is cancelled and the command is given
    /// [`SHUTDOWN_TIMEOUT`] to return its `Cancelled` error.
    pub fn run_command_until_exit<F, E>(
        self,
        command: impl FnOnce(CliContext) -> F,
    ) -> Result<(), E>
    where
        F: Future<Output = Result<(), E>>,
        E: From<std::io::Error>,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let context = CliContext::default();
        let cancel = context.cancel.clone();
        let result = runtime.block_on(async move {
            let fut = command(context);
            tokio::pin!(fut);
            tokio::select! {
                res = &mut fut => res,
                signal = wait_for_signal() => {
                    warn!(%signal, "Received shutdown signal, cancelling");
                    cancel.cancel();
                    finish_cancelled(fut, SHUTDOWN_TIMEOUT).await
                }
            }
        });

        debug!("Shutting down runtime");
        runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
        result
    }
}

/// Wait up to `grace` for a cancelled command, failing with `TimedOut` if it never returns.
async fn finish_cancelled<F, E>(fut: F, grace: Duration) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: From<std::io::Error>,
{
    match tokio::time::timeout(grace, fut).await {
        Ok(res) => res,
        Err(_) => {
            warn!(?grace, "Command ignored cancellation, giving up");
            Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "command did not stop after cancellation",
            )
            .into())
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigterm), Ok(mut sigint)) =
        (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
    else {
        return std::future::pending().await;
    };
    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    if tokio::signal::ctrl_c().await.is_err() {
        return std::future::pending().await;
    }
    "Ctrl+C"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_to_completion() {
        let res: Result<(), std::io::Error> =
            CliRunner::default().run_command_until_exit(|ctx| async move {
                assert!(!ctx.cancel.is_cancelled());
                Ok(())
            });
        res.unwrap();
    }

    #[test]
    fn propagates_errors() {
        let res: Result<(), std::io::Error> = CliRunner::default()
            .run_command_until_exit(|_| async { Err(std::io::Error::other("boom")) });
        assert_eq!(res.unwrap_err().to_string(), "boom");
    }

    #[tokio::test]
    async fn cancelled_command_is_bounded() {
        let stuck = std::future::pending::<Result<(), std::io::Error>>();
        let err = finish_cancelled(stuck, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn cancelled_command_result_is_kept() {
        let token = CancellationToken::new();
        token.cancel();
        let res: Result<(), std::io::Error> = finish_cancelled(
            async move {
                assert!(token.is_cancelled());
                Err(std::io::Error::other("cancelled"))
            },
            SHUTDOWN_TIMEOUT,
        )
        .await;
        assert_eq!(res.unwrap_err().to_string(), "cancelled");
    }
}
