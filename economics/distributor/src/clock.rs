use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::types::BlockHeight;

/// Source of "now" for cooldown checks, measured in host chain blocks.
pub trait BlockClock {
    fn current_height(&self) -> BlockHeight;
}

impl<C: BlockClock + ?Sized> BlockClock for Box<C> {
    fn current_height(&self) -> BlockHeight {
        (**self).current_height()
    }
}

impl<C: BlockClock + ?Sized> BlockClock for &C {
    fn current_height(&self) -> BlockHeight {
        (**self).current_height()
    }
}

/// Explicitly driven block height. Clones share the same height, so a test
/// can keep a handle and advance time under a running distributor.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    height: Arc<RwLock<BlockHeight>>,
}

impl ManualClock {
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: Arc::new(RwLock::new(height)),
        }
    }

    pub fn set(&self, height: BlockHeight) {
        *self.height.write() = height;
    }

    /// Move forward by `blocks`, returning the new height.
    pub fn advance(&self, blocks: u64) -> BlockHeight {
        let mut height = self.height.write();
        *height = height.saturating_add(blocks);
        *height
    }
}

impl BlockClock for ManualClock {
    fn current_height(&self) -> BlockHeight {
        *self.height.read()
    }
}

/// Height derived from wall-clock time since a genesis instant at a fixed
/// block interval.
#[derive(Debug, Clone)]
pub struct WallClock {
    genesis: DateTime<Utc>,
    block_time_ms: u64,
}

impl WallClock {
    /// `block_time_ms` of zero is treated as one millisecond.
    pub fn new(genesis: DateTime<Utc>, block_time_ms: u64) -> Self {
        Self {
            genesis,
            block_time_ms: block_time_ms.max(1),
        }
    }

    /// Height at an arbitrary instant; instants before genesis map to 0.
    pub fn height_at(&self, at: DateTime<Utc>) -> BlockHeight {
        let elapsed_ms = (at - self.genesis).num_milliseconds().max(0) as u64;
        elapsed_ms / self.block_time_ms
    }
}

impl BlockClock for WallClock {
    fn current_height(&self) -> BlockHeight {
        self.height_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn manual_clock_clones_share_height() {
        let clock = ManualClock::new(10);
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.current_height(), 15);
        clock.set(3);
        assert_eq!(handle.current_height(), 3);
    }

    #[test]
    fn manual_clock_saturates() {
        let clock = ManualClock::new(u64::MAX - 1);
        assert_eq!(clock.advance(10), u64::MAX);
    }

    #[test]
    fn wall_clock_counts_blocks() {
        let genesis = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock = WallClock::new(genesis, 6_000);
        assert_eq!(clock.height_at(genesis), 0);
        assert_eq!(clock.height_at(genesis + Duration::seconds(59)), 9);
        assert_eq!(clock.height_at(genesis + Duration::days(1)), 14_400);
        assert_eq!(clock.height_at(genesis - Duration::seconds(30)), 0);
    }

    #[test]
    fn boxed_clock_delegates() {
        let clock: Box<dyn BlockClock> = Box::new(ManualClock::new(42));
        assert_eq!(clock.current_height(), 42);
    }
}
