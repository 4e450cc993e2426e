//! Concrete Future types for token operations.
//!
//! Signing and verifying are CPU-bound, so the work runs on tokio's blocking
//! pool and the result comes back over a oneshot channel.

use crate::clock::{Clock, IdSource, SystemClock, UuidIds};
use crate::error::{IssueError, ValidateError};
use crate::issuer::GenerateParams;
use crate::outcome::{
    generate_token_with, validate_token_with, GenerateTokenResult, ValidateTokenResult,
};
use crate::verifier::ValidateParams;
use attestor_common::LoggingTransformer;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::oneshot;

/// Future for token generation.
pub struct TokenGenerationFuture {
    rx: oneshot::Receiver<GenerateTokenResult>,
}

impl TokenGenerationFuture {
    pub(crate) fn new(rx: oneshot::Receiver<GenerateTokenResult>) -> Self {
        Self { rx }
    }
}

impl Future for TokenGenerationFuture {
    type Output = GenerateTokenResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => {
                LoggingTransformer::log_worker_dropped("generation");
                Poll::Ready(GenerateTokenResult::from(Err(IssueError)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Future for token validation.
pub struct TokenValidationFuture {
    rx: oneshot::Receiver<ValidateTokenResult>,
}

impl TokenValidationFuture {
    pub(crate) fn new(rx: oneshot::Receiver<ValidateTokenResult>) -> Self {
        Self { rx }
    }
}

impl Future for TokenValidationFuture {
    type Output = ValidateTokenResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => {
                LoggingTransformer::log_worker_dropped("validation");
                Poll::Ready(ValidateTokenResult::from(Err(ValidateError)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Mint a token on the blocking pool.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn generate_token_async(params: GenerateParams) -> TokenGenerationFuture {
    generate_token_async_with(Arc::new(SystemClock), Arc::new(UuidIds), params)
}

/// [`generate_token_async`] with injected time and identifier sources.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn generate_token_async_with(
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    params: GenerateParams,
) -> TokenGenerationFuture {
    let (tx, rx) = oneshot::channel();

    tokio::task::spawn_blocking(move || {
        let _ = tx.send(generate_token_with(clock, ids, &params));
    });

    TokenGenerationFuture::new(rx)
}

/// Validate a token on the blocking pool.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn validate_token_async(params: ValidateParams) -> TokenValidationFuture {
    validate_token_async_with(Arc::new(SystemClock), params)
}

/// [`validate_token_async`] with an injected time source.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn validate_token_async_with(
    clock: Arc<dyn Clock>,
    params: ValidateParams,
) -> TokenValidationFuture {
    let (tx, rx) = oneshot::channel();

    tokio::task::spawn_blocking(move || {
        let _ = tx.send(validate_token_with(clock, &params));
    });

    TokenValidationFuture::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dropped_worker_resolves_to_generic_failure() {
        let (tx, rx) = oneshot::channel::<GenerateTokenResult>();
        drop(tx);
        let result = TokenGenerationFuture::new(rx).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("failed to generate token"));

        let (tx, rx) = oneshot::channel::<ValidateTokenResult>();
        drop(tx);
        let result = TokenValidationFuture::new(rx).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("invalid or expired token"));
    }
}
