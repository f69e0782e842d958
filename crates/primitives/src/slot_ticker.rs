use crate::{ChainSpec, Slot};
use std::time::{Duration, SystemTime};
use tokio::{
    sync::mpsc,
    time::{sleep_until, Instant},
};

/// Emits the slot number at every slot boundary.
///
/// A ticker started mid-slot first fires at the next boundary; a ticker
/// started before genesis fires slot 0 at genesis. Dropping the ticker stops
/// the background task.
#[derive(Debug)]
pub struct SlotTicker {
    rx: mpsc::Receiver<Slot>,
}

impl SlotTicker {
    /// Spawns the ticker task for a chain whose genesis was at `genesis`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(genesis: SystemTime, spec: ChainSpec) -> Self {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run_ticker(tx, genesis, spec));
        Self { rx }
    }

    /// Waits for the next slot boundary.
    ///
    /// Returns `None` once the ticker task has stopped.
    pub async fn tick(&mut self) -> Option<Slot> {
        self.rx.recv().await
    }
}

async fn run_ticker(tx: mpsc::Sender<Slot>, genesis: SystemTime, spec: ChainSpec) {
    let slot_duration = spec.slot_duration();

    // Align with the upcoming boundary, then step one slot at a time.
    let (mut slot, until) = match SystemTime::now().duration_since(genesis) {
        Ok(elapsed) => {
            let next = elapsed.as_secs() / spec.seconds_per_slot + 1;
            let boundary = Duration::from_secs(next * spec.seconds_per_slot);
            (next, boundary.saturating_sub(elapsed))
        }
        Err(not_yet) => (0, not_yet.duration()),
    };
    let mut next_tick = Instant::now() + until;

    loop {
        sleep_until(next_tick).await;
        if tx.send(slot).await.is_err() {
            return;
        }
        slot += 1;
        next_tick += slot_duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_consecutive_slots() {
        let spec = ChainSpec { slots_per_epoch: 32, seconds_per_slot: 8 };
        let mut ticker = SlotTicker::new(SystemTime::now(), spec);

        assert_eq!(ticker.tick().await, Some(1));
        assert_eq!(ticker.tick().await, Some(2));
        assert_eq!(ticker.tick().await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn starts_at_genesis_when_early() {
        let spec = ChainSpec { slots_per_epoch: 32, seconds_per_slot: 8 };
        let genesis = SystemTime::now() + Duration::from_secs(3);
        let mut ticker = SlotTicker::new(genesis, spec);

        assert_eq!(ticker.tick().await, Some(0));
        assert_eq!(ticker.tick().await, Some(1));
    }
}
