//! Device arrival detection.

use std::collections::BTreeSet;

use tracing::debug;

/// Bus number and device address.
pub type Key = (u8, u8);

/// Tracks devices between bus scans and reports the newly attached ones.
#[derive(Debug, Default)]
pub struct Watcher {
    seen: BTreeSet<Key>,
}

impl Watcher {
    /// Creates a watcher that treats every device of the first scan as new.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the devices from `scan` that were not present in the previous
    /// scan. Devices missing from `scan` are forgotten, so a device that is
    /// detached and attached again is reported again.
    pub fn arrivals<T>(&mut self, scan: Vec<T>, key: impl Fn(&T) -> Key) -> Vec<T> {
        let mut seen = BTreeSet::new();
        let new = (scan.into_iter())
            .filter(|dev| {
                let k = key(dev);
                seen.insert(k);
                !self.seen.contains(&k)
            })
            .collect::<Vec<_>>();
        for &(bus, addr) in self.seen.difference(&seen) {
            debug!("Device {bus:03}:{addr:03} detached");
        }
        self.seen = seen;
        new
    }

    /// Returns the number of tracked devices.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns whether no devices are tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(w: &mut Watcher, v: &[Key]) -> Vec<Key> {
        w.arrivals(v.to_vec(), |&k| k)
    }

    #[test]
    fn arrivals() {
        let mut w = Watcher::new();
        assert!(scan(&mut w, &[]).is_empty());
        assert!(w.is_empty());

        assert_eq!(scan(&mut w, &[(1, 4), (1, 7)]), [(1, 4), (1, 7)]);
        assert!(scan(&mut w, &[(1, 4), (1, 7)]).is_empty());
        assert_eq!(w.len(), 2);

        // New device on another bus
        assert_eq!(scan(&mut w, &[(1, 4), (1, 7), (2, 3)]), [(2, 3)]);

        // Detach and re-attach
        assert!(scan(&mut w, &[(1, 7), (2, 3)]).is_empty());
        assert_eq!(w.len(), 2);
        assert_eq!(scan(&mut w, &[(1, 4), (1, 7), (2, 3)]), [(1, 4)]);
    }

    #[test]
    fn readdressed() {
        let mut w = Watcher::new();
        assert_eq!(scan(&mut w, &[(1, 4)]), [(1, 4)]);
        // Re-plugging usually assigns a new address without a scan in between
        assert_eq!(scan(&mut w, &[(1, 5)]), [(1, 5)]);
        assert!(scan(&mut w, &[(1, 5)]).is_empty());
    }
}
