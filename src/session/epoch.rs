use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::util::{PuttrackError, PuttrackResult};

/// Shared calibration generation counter.
///
/// The session bumps it on every new setup. Long-running work holds a clone
/// together with the epoch it started under and stops once the two diverge.
#[derive(Clone, Debug, Default)]
pub struct EpochHandle(Arc<AtomicU64>);

impl EpochHandle {
    /// Current epoch.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Fails with [`PuttrackError::SessionSuperseded`] once `epoch` is stale.
    pub fn ensure_current(&self, epoch: u64) -> PuttrackResult<()> {
        let current = self.current();
        if current != epoch {
            return Err(PuttrackError::SessionSuperseded { epoch, current });
        }
        Ok(())
    }

    pub(crate) fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}
