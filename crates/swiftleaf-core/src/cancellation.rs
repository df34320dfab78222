use anyhow::{Result, anyhow};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared flag used to abandon a superseded parse or a pending chunk advance.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(anyhow!("operation cancelled at stage={stage}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn clones_share_cancellation() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(observer.check_cancelled("batch").is_ok());

        token.cancel();

        assert!(observer.is_cancelled());
        let err = observer.check_cancelled("batch").unwrap_err();
        assert!(err.to_string().contains("stage=batch"));
    }
}
