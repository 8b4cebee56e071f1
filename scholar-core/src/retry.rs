use std::time::Duration;

use tracing::warn;

use crate::{LlmRequest, LlmResponse, ScholarError, ToolCallingLlm};

/// Bounded exponential backoff applied to transient HTTP failures of the
/// inference backend.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub initial_delay: Duration,
    pub exp_base: u32,
    pub http_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_secs(1),
            exp_base: 3,
            http_status_codes: vec![429, 500, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows failed attempt number `attempt`
    /// (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1) as u32;
        let factor = self.exp_base.saturating_pow(exponent);
        self.initial_delay.saturating_mul(factor)
    }

    pub fn is_retryable(&self, error: &ScholarError) -> bool {
        match error {
            ScholarError::HttpStatus { status, .. } => self.http_status_codes.contains(status),
            _ => false,
        }
    }
}

pub struct Retrying<L> {
    llm: L,
    policy: RetryPolicy,
}

impl<L> Retrying<L> {
    pub fn new(llm: L, policy: RetryPolicy) -> Self {
        Self { llm, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait::async_trait]
impl<L> ToolCallingLlm for Retrying<L>
where
    L: ToolCallingLlm,
{
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, ScholarError> {
        if self.policy.attempts == 0 {
            return Err(ScholarError::MaxRetriesExceeded {
                max: 0,
                reason: "retry policy allows no attempts".to_string(),
            });
        }

        for attempt in 1..=self.policy.attempts {
            match self.llm.invoke(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    if !self.policy.is_retryable(&error) {
                        return Err(error);
                    }

                    if attempt == self.policy.attempts {
                        return Err(ScholarError::MaxRetriesExceeded {
                            max: self.policy.attempts,
                            reason: error.to_string(),
                        });
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(attempt, ?delay, %error, "transient LLM failure, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(ScholarError::MaxRetriesExceeded {
            max: self.policy.attempts,
            reason: "retry loop exited without a result".to_string(),
        })
    }
}
