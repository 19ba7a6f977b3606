//! Batched estimation with normalization and fallback.

use std::time::Duration;

use tk_core::{CommitRecord, Estimation, EstimationPolicy, EstimationResult};

use crate::analysis::{build_prompt, parse_analysis};
use crate::{EstimationBackend, LlmError};

/// Upper bound on one estimation call.
pub const ESTIMATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends commit batches to an [`EstimationBackend`].
///
/// Never fails: any error becomes an [`Estimation::Fallback`].
#[derive(Debug)]
pub struct Orchestrator<B> {
    backend: B,
    policy: EstimationPolicy,
    timeout: Duration,
}

impl<B: EstimationBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            policy: EstimationPolicy::default(),
            timeout: ESTIMATE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn policy(&self) -> &EstimationPolicy {
        &self.policy
    }

    /// Estimates a whole batch with a single backend call.
    pub async fn estimate_batch(&self, commits: &[CommitRecord]) -> Estimation {
        if commits.is_empty() {
            return Estimation::Model(EstimationResult::zero("No commits to analyze"));
        }

        match self.request(commits).await {
            Ok(result) => Estimation::Model(self.policy.normalize(result)),
            Err(err) => {
                let category = err.category();
                tracing::warn!(
                    %category,
                    error = %err,
                    commits = commits.len(),
                    "estimation failed, using fallback"
                );
                self.policy.fallback(commits, category, err.to_string())
            }
        }
    }

    async fn request(&self, commits: &[CommitRecord]) -> Result<EstimationResult, LlmError> {
        let prompt = build_prompt(commits);
        tracing::debug!(commits = commits.len(), "requesting batch estimate");
        let text = tokio::time::timeout(self.timeout, self.backend.generate(&prompt))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;
        parse_analysis(&text)
    }
}
