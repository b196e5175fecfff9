//! Bounded retry with exponential backoff around page fetches

use anyhow::Result;
use std::time::Duration;

use crate::hubspot::TokenManager;
use crate::models::{Account, EntityKind};

/// Retry budget exhausted for one entity type
#[derive(Debug, thiserror::Error)]
#[error("giving up on {entity} after repeated fetch failures")]
pub struct FetchExhaustedError {
    pub entity: EntityKind,
}

/// Retry schedule for remote fetches
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): base * 2^attempt,
    /// so 10s, 20s, 40s with the default schedule.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt)
    }
}

/// Run `op` with bounded retries.
///
/// A token that expired mid-pagination and a transient API failure look
/// the same from here, so every failed attempt checks the wall clock
/// against the account's token expiry and refreshes before retrying.
/// A failed refresh propagates immediately as
/// [`CredentialRefreshError`](crate::hubspot::CredentialRefreshError);
/// exhausting the attempt budget yields [`FetchExhaustedError`].
pub fn execute<T, F>(
    policy: &RetryPolicy,
    tokens: &TokenManager,
    account: &mut Account,
    entity: EntityKind,
    mut op: F,
) -> Result<T>
where
    F: FnMut(&Account) -> Result<T>,
{
    for attempt in 1..=policy.max_attempts {
        match op(account) {
            Ok(value) => return Ok(value),
            Err(err) => {
                log::warn!(
                    "{entity} fetch attempt {attempt}/{} failed: {err:#}",
                    policy.max_attempts
                );
                if attempt == policy.max_attempts {
                    break;
                }
                if account.token_expired() {
                    tokens.refresh_now(account)?;
                }
                std::thread::sleep(policy.delay_for(attempt));
            }
        }
    }

    Err(FetchExhaustedError { entity }.into())
}
