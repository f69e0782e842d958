use crate::{Epoch, Slot};
use std::time::{Duration, SystemTime};

/// The chain parameters slot and epoch arithmetic depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSpec {
    /// Number of slots in one epoch.
    pub slots_per_epoch: u64,
    /// Wall-clock duration of one slot, in seconds.
    pub seconds_per_slot: u64,
}

impl ChainSpec {
    /// Mainnet parameters.
    pub const fn mainnet() -> Self {
        Self { slots_per_epoch: 32, seconds_per_slot: 12 }
    }

    /// Returns the first slot of `epoch`.
    pub const fn start_slot(&self, epoch: Epoch) -> Slot {
        epoch * self.slots_per_epoch
    }

    /// Returns the epoch containing `slot`.
    pub const fn epoch_at(&self, slot: Slot) -> Epoch {
        slot / self.slots_per_epoch
    }

    /// Wall-clock duration of one slot.
    pub const fn slot_duration(&self) -> Duration {
        Duration::from_secs(self.seconds_per_slot)
    }

    /// Returns the current slot of a chain whose genesis was at `genesis`.
    ///
    /// Clamps to slot 0 before genesis.
    pub fn slots_since(&self, genesis: SystemTime) -> Slot {
        match SystemTime::now().duration_since(genesis) {
            Ok(elapsed) => elapsed.as_secs() / self.seconds_per_slot,
            Err(_) => 0,
        }
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_slot_arithmetic() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.start_slot(0), 0);
        assert_eq!(spec.start_slot(10), 320);
        assert_eq!(spec.epoch_at(0), 0);
        assert_eq!(spec.epoch_at(31), 0);
        assert_eq!(spec.epoch_at(32), 1);
    }

    #[test]
    fn slots_since_genesis() {
        let spec = ChainSpec::mainnet();
        let genesis = SystemTime::now() - Duration::from_secs(3 * spec.seconds_per_slot);
        assert_eq!(spec.slots_since(genesis), 3);
    }

    #[test]
    fn slots_since_clamps_before_genesis() {
        let spec = ChainSpec::mainnet();
        let genesis = SystemTime::now() + Duration::from_secs(60);
        assert_eq!(spec.slots_since(genesis), 0);
    }
}
