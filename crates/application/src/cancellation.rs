use std::future::Future;

use tokio_util::sync::CancellationToken;

use metasync_core::AppError;
use metasync_domain::{Annotated, Annotations};

/// Races an operation against a cancellation token.
///
/// The operation future is dropped on cancellation, which releases any
/// in-flight request.
pub async fn cancellable<T, F>(
    token: &CancellationToken,
    operation: &str,
    future: F,
) -> Annotated<T>
where
    F: Future<Output = Annotated<T>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Annotated::err(
            Annotations::new(),
            AppError::Cancelled(format!("{operation} cancelled")),
        ),
        annotated = future => annotated,
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;

    use tokio_util::sync::CancellationToken;

    use metasync_core::AppError;
    use metasync_domain::{Annotated, Annotations};

    use super::cancellable;

    #[tokio::test]
    async fn cancelled_token_short_circuits_pending_operation() {
        let token = CancellationToken::new();
        token.cancel();

        let result: Annotated<()> = cancellable(&token, "list users", pending()).await;

        assert!(matches!(result.result, Err(AppError::Cancelled(ref message)) if message == "list users cancelled"));
    }

    #[tokio::test]
    async fn completed_operation_passes_through() {
        let token = CancellationToken::new();

        let result = cancellable(&token, "list users", async {
            Annotated::ok(Annotations::new(), 7)
        })
        .await;

        assert!(matches!(result.result, Ok(7)));
    }
}
