//! Request identifiers and their allocator.
//!
//! Identifiers start at 1 and wrap back to 1 just below the configured
//! maximum, so neither 0 (the unassigned sentinel) nor the maximum itself is
//! ever issued. Candidates still held by a pending request are skipped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Identifier correlating a native sign-in call with its pending callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u32);

impl RequestId {
    /// Sentinel value meaning "no request".
    pub const UNASSIGNED: RequestId = RequestId(0);

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for RequestId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues request identifiers in `1..max`.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
    max: u32,
}

impl IdAllocator {
    /// Production boundary: wrap just below `u32::MAX`.
    pub const DEFAULT_MAX: u32 = u32::MAX;

    /// Create an allocator that wraps when the counter reaches `max`.
    ///
    /// `max` must be at least 2 so that id 1 can be issued; callers validate
    /// this through [`crate::config::BridgeConfig::validate`].
    pub fn new(max: u32) -> Self {
        Self { next: 1, max: max.max(2) }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// The id the next call to [`allocate`](Self::allocate) tries first.
    pub fn peek(&self) -> RequestId {
        RequestId(self.next)
    }

    /// Issue the next identifier not reported as pending by `is_pending`.
    ///
    /// Tries at most `max - 1` candidates, i.e. one full cycle of the id space.
    pub fn allocate(
        &mut self,
        is_pending: impl Fn(RequestId) -> bool,
    ) -> Result<RequestId, BridgeError> {
        for _ in 1..self.max {
            let candidate = RequestId(self.next);
            self.advance();
            if !is_pending(candidate) {
                return Ok(candidate);
            }
            tracing::warn!(request_id = %candidate, "request id still pending after wrap, skipping");
        }
        Err(BridgeError::IdSpaceExhausted { max: self.max })
    }

    /// Restart the sequence at 1.
    pub fn reset(&mut self) {
        self.next = 1;
    }

    fn advance(&mut self) {
        self.next += 1;
        if self.next >= self.max {
            self.next = 1;
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_starts_at_one_and_increments() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.allocate(|_| false).unwrap(), RequestId(1));
        assert_eq!(ids.allocate(|_| false).unwrap(), RequestId(2));
        assert_eq!(ids.allocate(|_| false).unwrap(), RequestId(3));
    }

    #[test]
    fn test_wraps_below_max_skipping_zero() {
        let mut ids = IdAllocator::new(4);
        let issued: Vec<u32> = (0..3).map(|_| ids.allocate(|_| false).unwrap().get()).collect();
        assert_eq!(issued, vec![1, 2, 3]);
        assert_eq!(ids.allocate(|_| false).unwrap(), RequestId(1));
    }

    #[test]
    fn test_production_boundary_never_issues_max() {
        let mut ids = IdAllocator::default();
        ids.next = u32::MAX - 1;
        assert_eq!(ids.allocate(|_| false).unwrap().get(), u32::MAX - 1);
        assert_eq!(ids.allocate(|_| false).unwrap().get(), 1);
    }

    #[test]
    fn test_skips_pending_ids_after_wrap() {
        let mut ids = IdAllocator::new(4);
        let pending: HashSet<RequestId> = [RequestId(1), RequestId(2)].into_iter().collect();
        ids.next = 3;
        assert_eq!(ids.allocate(|id| pending.contains(&id)).unwrap(), RequestId(3));
        // Wrapped: 1 and 2 are pending, so the search lands on 3 again.
        assert_eq!(ids.allocate(|id| pending.contains(&id)).unwrap(), RequestId(3));
    }

    #[test]
    fn test_exhausted_when_every_id_pending() {
        let mut ids = IdAllocator::new(4);
        let err = ids.allocate(|_| true).unwrap_err();
        assert!(matches!(err, BridgeError::IdSpaceExhausted { max: 4 }));
    }

    #[test]
    fn test_degenerate_max_is_clamped() {
        let mut ids = IdAllocator::new(0);
        assert_eq!(ids.max(), 2);
        assert_eq!(ids.allocate(|_| false).unwrap(), RequestId(1));
        assert_eq!(ids.allocate(|_| false).unwrap(), RequestId(1));
    }

    #[test]
    fn test_display_and_sentinel() {
        assert_eq!(RequestId::new(42).to_string(), "42");
        assert_eq!(RequestId::UNASSIGNED.get(), 0);
        assert_eq!(RequestId::from(7), RequestId::new(7));
    }
}
