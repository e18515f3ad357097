//! Shared utilities for use cases.
//!
//! Cancellation checking and admission control used by every task that
//! talks to the gateway.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use super::deliberate::DeliberationError;
use crate::ports::model_gateway::GatewayError;

/// Fold gateway-observed cancellation into the session's cancellation
/// error; everything else stays a gateway error.
pub(crate) fn map_gateway_error(error: GatewayError) -> DeliberationError {
    if error.is_cancelled() {
        DeliberationError::Cancelled
    } else {
        DeliberationError::Gateway(error)
    }
}

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<(), DeliberationError> {
    if cancel.is_cancelled() {
        return Err(DeliberationError::Cancelled);
    }
    Ok(())
}

/// Acquire a slot under the session's model-call ceiling, aborting the wait
/// if the cancel signal trips first. This is the engine's only source of
/// back-pressure.
pub(crate) async fn acquire_call_permit(
    permits: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Result<OwnedSemaphorePermit, DeliberationError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeliberationError::Cancelled),
        permit = Arc::clone(permits).acquire_owned() => {
            permit.map_err(|_| DeliberationError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_cancelled_reflects_token_state() {
        let token = CancellationToken::new();
        assert!(check_cancelled(&token).is_ok());
        token.cancel();
        assert!(matches!(
            check_cancelled(&token),
            Err(DeliberationError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn permit_acquisition_respects_cancellation() {
        let permits = Arc::new(Semaphore::new(1));
        let held = Arc::clone(&permits).acquire_owned().await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let result = acquire_call_permit(&permits, &token).await;
        assert!(matches!(result, Err(DeliberationError::Cancelled)));

        drop(held);
        let token = CancellationToken::new();
        assert!(acquire_call_permit(&permits, &token).await.is_ok());
    }
}
