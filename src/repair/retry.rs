//! Retrying fix proposals
//!
//! Each attempt runs under a timeout. Failed attempts are retried after a
//! linearly growing, capped delay (see [`RetryPolicy::delay_for`]). Every
//! failure kind is retried; the last error is returned once attempts run out.

use tokio::time::{sleep, timeout};

use crate::config::RetryPolicy;
use crate::domain::Module;
use crate::proposer::{FixProposer, FixRequest, ProposalError};

/// A successful proposal and how many attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub module: Module,
    pub attempts: u32,
}

/// Ask `proposer` for a fix, retrying per `policy`
pub async fn propose_with_retry(
    proposer: &dyn FixProposer,
    request: &FixRequest,
    policy: &RetryPolicy,
) -> Result<Proposal, ProposalError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = match timeout(policy.attempt_timeout(), proposer.propose(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProposalError::Timeout),
        };

        match outcome {
            Ok(module) => {
                return Ok(Proposal {
                    module,
                    attempts: attempt,
                });
            }
            Err(e) if attempt >= max_attempts => {
                tracing::warn!(
                    module = %request.module_name,
                    attempts = attempt,
                    error = %e,
                    "giving up on module"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    module = %request.module_name,
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis(),
                    "proposal failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
