use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::da::Disperser;
use crate::error::{DaError, Result};
use crate::types::{BlobReference, DispersalReceipt};
use crate::utils::to_hex_prefixed;

/// Bounds for the confirmation polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total time spent waiting for a terminal status, measured from submission
    pub timeout: Duration,
    /// Pause before the first status query and between queries
    pub retry_interval: Duration,
    /// Consecutive failed status queries tolerated; `None` keeps polling
    /// until the deadline
    pub max_transient_errors: Option<u32>,
}

/// Race a future against the cancellation token
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DaError::Cancelled),
        res = fut => res,
    }
}

/// Sleep one interval, never past `deadline`
async fn wait(cancel: &CancellationToken, interval: Duration, deadline: Instant) -> Result<()> {
    let wake = (Instant::now() + interval).min(deadline);
    cancellable(cancel, async {
        sleep_until(wake).await;
        Ok(())
    })
    .await
}

/// Submit `payload` and poll until the blob is confirmed, fails, or the
/// deadline passes. State lives only in this call; a crash mid-poll
/// orphans the submission.
pub async fn disperse(
    disperser: &dyn Disperser,
    payload: Vec<u8>,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<BlobReference> {
    let reply = match cancellable(cancel, disperser.submit(payload)).await {
        Ok(reply) => reply,
        Err(DaError::Cancelled) => return Err(DaError::Cancelled),
        Err(e) => {
            error!("Unable to disperse blob, aborting: {e}");
            return Err(DaError::DispersalRejected {
                reason: e.to_string(),
            });
        }
    };

    let receipt = reply.receipt;
    if reply.status.is_failure() {
        error!("Disperser rejected blob {receipt} with status {}", reply.status);
        return Err(DaError::DispersalRejected {
            reason: format!("reply status is {}", reply.status),
        });
    }

    let deadline = Instant::now() + policy.timeout;
    debug!(
        "Blob {receipt} accepted ({}), polling every {:?} for up to {:?}",
        reply.status, policy.retry_interval, policy.timeout
    );

    // The disperser needs time to pick the request up
    wait(cancel, policy.retry_interval, deadline).await?;

    let mut consecutive_errors = 0u32;
    while Instant::now() < deadline {
        let query = async {
            timeout_at(deadline, disperser.poll(&receipt))
                .await
                .unwrap_or_else(|_| Err(dispersal_timeout(&receipt, policy)))
        };
        match cancellable(cancel, query).await {
            Ok(status) if status.status.is_confirmed() => {
                let Some(reference) = status.reference else {
                    error!("Blob {receipt} is {} but carries no reference", status.status);
                    return Err(DaError::MissingBlobReference {
                        request_id: receipt.to_string(),
                        status: status.status,
                    });
                };
                info!(
                    "✅ Blob {receipt} dispersed: batch header hash {}, blob index {}",
                    to_hex_prefixed(&reference.batch_header_hash),
                    reference.blob_index
                );
                return Ok(reference);
            }
            Ok(status) if status.status.is_failure() => {
                error!("Blob {receipt} dispersal failed in processing: {}", status.status);
                return Err(DaError::DispersalFailed {
                    request_id: receipt.to_string(),
                    status: status.status,
                });
            }
            Ok(status) => {
                consecutive_errors = 0;
                debug!("Blob {receipt} still {}", status.status);
            }
            Err(e @ (DaError::Cancelled | DaError::DispersalTimeout { .. })) => return Err(e),
            Err(e) => {
                consecutive_errors += 1;
                warn!("Status query for blob {receipt} failed ({consecutive_errors} in a row): {e}");
                if let Some(max) = policy.max_transient_errors {
                    if consecutive_errors >= max {
                        return Err(status_query_failed(&receipt, consecutive_errors, e));
                    }
                }
            }
        }

        wait(cancel, policy.retry_interval, deadline).await?;
    }

    Err(dispersal_timeout(&receipt, policy))
}

fn dispersal_timeout(receipt: &DispersalReceipt, policy: &PollPolicy) -> DaError {
    error!("Timed out after {:?} waiting for blob {receipt}", policy.timeout);
    DaError::DispersalTimeout {
        request_id: receipt.to_string(),
        timeout: policy.timeout,
    }
}

fn status_query_failed(receipt: &DispersalReceipt, attempts: u32, last: DaError) -> DaError {
    DaError::StatusQueryFailed {
        request_id: receipt.to_string(),
        attempts,
        last_error: last.to_string(),
    }
}
