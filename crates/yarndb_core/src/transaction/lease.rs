//! The single transaction slot and its lease.

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionId;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Lease {
    txid: TransactionId,
    deadline: Instant,
}

impl Lease {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline > now
    }
}

/// Serializes transaction lifecycles.
///
/// At most one transaction holds the gate. A holder that stays idle past
/// its lease can be displaced by the next [`TransactionGate::acquire`].
#[derive(Debug)]
pub(crate) struct TransactionGate {
    slot: Mutex<Option<Lease>>,
    lease: Duration,
}

impl TransactionGate {
    pub fn new(lease: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            lease,
        }
    }

    /// Claims the slot for `txid`.
    ///
    /// Returns the id of an expired holder that was displaced, if any.
    pub fn acquire(&self, txid: TransactionId) -> CoreResult<Option<TransactionId>> {
        let mut slot = self.slot.lock();
        let now = Instant::now();
        let displaced = match *slot {
            Some(lease) if lease.is_live(now) => return Err(CoreError::TransactionActive),
            Some(lease) => Some(lease.txid),
            None => None,
        };
        *slot = Some(Lease {
            txid,
            deadline: now + self.lease,
        });
        Ok(displaced)
    }

    /// Extends the lease of `txid`.
    pub fn renew(&self, txid: TransactionId) -> CoreResult<()> {
        let mut slot = self.slot.lock();
        let now = Instant::now();
        Self::check(&mut slot, txid, now)?;
        *slot = Some(Lease {
            txid,
            deadline: now + self.lease,
        });
        Ok(())
    }

    /// Runs `apply` while holding the slot, then releases it.
    ///
    /// Fails without running `apply` if `txid` no longer holds a live lease.
    pub fn finish<R>(&self, txid: TransactionId, apply: impl FnOnce() -> R) -> CoreResult<R> {
        let mut slot = self.slot.lock();
        Self::check(&mut slot, txid, Instant::now())?;
        let result = apply();
        *slot = None;
        Ok(result)
    }

    /// Releases the slot if `txid` holds it. Returns false if the lease
    /// was lost to expiry.
    pub fn release(&self, txid: TransactionId) -> bool {
        let mut slot = self.slot.lock();
        match *slot {
            Some(lease) if lease.txid == txid => {
                let live = lease.is_live(Instant::now());
                *slot = None;
                live
            }
            _ => false,
        }
    }

    /// Returns true if some transaction holds a live lease.
    pub fn is_held(&self) -> bool {
        self.slot
            .lock()
            .is_some_and(|lease| lease.is_live(Instant::now()))
    }

    fn check(slot: &mut Option<Lease>, txid: TransactionId, now: Instant) -> CoreResult<()> {
        match *slot {
            Some(lease) if lease.txid == txid && lease.is_live(now) => Ok(()),
            Some(lease) if lease.txid == txid => {
                *slot = None;
                Err(CoreError::TransactionExpired { txid })
            }
            _ => Err(CoreError::TransactionExpired { txid }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(30);

    fn txid(n: u64) -> TransactionId {
        TransactionId::new(n)
    }

    #[test]
    fn second_acquire_conflicts() {
        let gate = TransactionGate::new(Duration::from_secs(30));
        assert_eq!(gate.acquire(txid(1)).unwrap(), None);
        assert!(matches!(
            gate.acquire(txid(2)),
            Err(CoreError::TransactionActive)
        ));
        assert!(gate.is_held());
    }

    #[test]
    fn release_frees_the_slot() {
        let gate = TransactionGate::new(Duration::from_secs(30));
        gate.acquire(txid(1)).unwrap();
        assert!(gate.release(txid(1)));
        assert!(!gate.is_held());
        assert_eq!(gate.acquire(txid(2)).unwrap(), None);
    }

    #[test]
    fn expired_lease_is_displaced() {
        let gate = TransactionGate::new(SHORT);
        gate.acquire(txid(1)).unwrap();
        thread::sleep(SHORT * 2);

        assert!(!gate.is_held());
        assert_eq!(gate.acquire(txid(2)).unwrap(), Some(txid(1)));
        assert!(matches!(
            gate.renew(txid(1)),
            Err(CoreError::TransactionExpired { .. })
        ));
        assert!(!gate.release(txid(1)));
        assert!(gate.is_held());
    }

    #[test]
    fn renew_extends_the_lease() {
        let gate = TransactionGate::new(Duration::from_millis(200));
        gate.acquire(txid(1)).unwrap();
        for _ in 0..4 {
            thread::sleep(Duration::from_millis(80));
            gate.renew(txid(1)).unwrap();
        }
        assert!(gate.is_held());
    }

    #[test]
    fn finish_runs_only_for_live_holder() {
        let gate = TransactionGate::new(SHORT);
        gate.acquire(txid(1)).unwrap();
        assert_eq!(gate.finish(txid(1), || 7).unwrap(), 7);
        assert!(!gate.is_held());

        gate.acquire(txid(2)).unwrap();
        thread::sleep(SHORT * 2);
        let mut ran = false;
        let result = gate.finish(txid(2), || ran = true);
        assert!(result.is_err());
        assert!(!ran);
        assert!(!gate.is_held());
    }
}
