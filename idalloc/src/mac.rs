// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use net::Mac;

/// Issues locally-administered MAC addresses from a fixed base.
///
/// Addresses are unique for the life of the process; there is no free().
#[derive(Debug)]
pub struct MacAllocator {
    next: u64,
}

impl MacAllocator {
    /// `02:00:00:00:00:00`, locally administered, unicast.
    const BASE: u64 = 0x02_00_00_00_00_00;

    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> Mac {
        let mac = Mac::from_u64(Self::BASE + self.next);
        self.next += 1;
        mac
    }
}

impl Default for MacAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn monotonic_and_local() {
        let mut alloc = MacAllocator::new();
        let first = alloc.allocate();
        let second = alloc.allocate();
        assert_eq!(first.to_string(), "02:00:00:00:00:01");
        assert_eq!(second.to_string(), "02:00:00:00:00:02");
        assert!(first.is_local());
        assert!(!first.is_multicast());
        assert_ne!(first, second);
    }
}
