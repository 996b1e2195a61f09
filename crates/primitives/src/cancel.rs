use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Drive `fut` until it completes or `token` fires, whichever comes first.
///
/// A fired token drops the in-flight future and yields [`Error::Cancelled`].
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn passes_through_results() {
        let token = CancellationToken::new();
        assert_eq!(cancellable(&token, async { Ok(7) }).await.unwrap(), 7);

        let err = cancellable::<(), _>(&token, async { Err(Error::remote("simulate", "503")) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteRequest);
    }

    #[tokio::test]
    async fn fired_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let res = cancellable(&token, async { Ok(1) }).await;
        assert!(matches!(res, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn aborts_in_flight_call() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let res = cancellable(&token, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(Error::Cancelled)));
    }
}
