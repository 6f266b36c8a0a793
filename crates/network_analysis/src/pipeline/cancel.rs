use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bevy::log::info;

use crate::error::AnalysisError;

/// Shared cancellation flag, checked between analysis stages.
///
/// Clones share the flag. Cancelling discards whatever the pass computed so
/// far; nothing is published until a pass completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the token has been tripped.
    pub fn check(&self, stage: &str) -> Result<(), AnalysisError> {
        if self.is_cancelled() {
            info!("Analysis cancelled before {stage}");
            return Err(AnalysisError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check("stats").is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check("stats"), Err(AnalysisError::Cancelled));
    }
}
