use crate::chunk::Chunk;

/// Result of one segmentation attempt for a batch.
#[derive(Debug)]
pub enum AttemptOutcome {
    Parsed(Vec<Chunk>),
    /// Transport failure, malformed reply or empty result.
    Retryable(anyhow::Error),
    /// The service cannot answer at all; retrying is pointless.
    Fatal(anyhow::Error),
}

impl AttemptOutcome {
    pub fn reason(&self) -> String {
        match self {
            Self::Parsed(_) => "parsed".to_string(),
            Self::Retryable(err) | Self::Fatal(err) => format!("{err:#}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Accept,
    Retry(u32),
    Fallback,
}

/// `attempt` is zero-based; `max_retries` retries follow the first attempt.
pub fn next_step(attempt: u32, max_retries: u32, outcome: &AttemptOutcome) -> RetryStep {
    match outcome {
        AttemptOutcome::Parsed(_) => RetryStep::Accept,
        AttemptOutcome::Fatal(_) => RetryStep::Fallback,
        AttemptOutcome::Retryable(_) if attempt < max_retries => RetryStep::Retry(attempt + 1),
        AttemptOutcome::Retryable(_) => RetryStep::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn parsed_is_accepted_on_any_attempt() {
        let outcome = AttemptOutcome::Parsed(vec![Chunk::new(vec!["word".into()], 0)]);
        assert_eq!(next_step(0, 2, &outcome), RetryStep::Accept);
        assert_eq!(next_step(2, 2, &outcome), RetryStep::Accept);
    }

    #[test]
    fn retryable_allows_exactly_max_retries() {
        let outcome = AttemptOutcome::Retryable(anyhow!("timeout"));
        assert_eq!(next_step(0, 2, &outcome), RetryStep::Retry(1));
        assert_eq!(next_step(1, 2, &outcome), RetryStep::Retry(2));
        assert_eq!(next_step(2, 2, &outcome), RetryStep::Fallback);
        assert_eq!(next_step(0, 0, &outcome), RetryStep::Fallback);
    }

    #[test]
    fn fatal_falls_back_immediately() {
        let outcome = AttemptOutcome::Fatal(anyhow!("not configured"));
        assert_eq!(next_step(0, 2, &outcome), RetryStep::Fallback);
        assert!(outcome.reason().contains("not configured"));
    }
}
