//! Shared state between the poller, render and input loops.
//!
//! [`Feed`] is the append-only, chronologically ordered list of everything
//! discovered so far.  It is a cheap-to-clone handle around a lock-guarded
//! `Vec`: the poller is the only writer, the render loop takes short read
//! locks and copies out the `Arc`s it needs, so no loop ever holds the lock
//! across a draw or a network call.
//!
//! [`Viewport`] publishes the size of the last rendered frame (or the latest
//! resize) so the poller can size its fetch limit.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::source::FeedEntry;

#[derive(Default)]
struct FeedInner {
    /// Oldest first; positions never change once pushed.
    entries: Vec<Arc<FeedEntry>>,
    /// Ids already present, to avoid appending an overlap twice.
    seen: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct Feed {
    inner: Arc<RwLock<FeedInner>>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries in the order given, skipping ids already present.
    ///
    /// Returns how many entries were actually added.
    pub fn append<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = FeedEntry>,
    {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        for entry in entries {
            if inner.seen.insert(entry.id().to_string()) {
                inner.entries.push(Arc::new(entry));
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.read(|inner| inner.entries.len())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `n` of the most recent entries, newest first.
    pub fn newest(&self, n: usize) -> Vec<Arc<FeedEntry>> {
        self.read(|inner| inner.entries.iter().rev().take(n).cloned().collect())
    }

    /// A copy of the whole feed, oldest first.
    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<Arc<FeedEntry>> {
        self.read(|inner| inner.entries.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&FeedInner) -> T) -> T {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&inner)
    }
}

/// Width and height of the most recently drawn frame, packed into one atomic
/// so readers never see a width from one frame and a height from another.
#[derive(Clone, Default)]
pub struct Viewport {
    packed: Arc<AtomicU32>,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        let viewport = Self::default();
        viewport.set(width, height);
        viewport
    }

    pub fn set(&self, width: u16, height: u16) {
        let packed = (u32::from(width) << 16) | u32::from(height);
        self.packed.store(packed, Ordering::Relaxed);
    }

    /// `(width, height)`
    pub fn get(&self) -> (u16, u16) {
        let packed = self.packed.load(Ordering::Relaxed);
        ((packed >> 16) as u16, (packed & 0xFFFF) as u16)
    }

    pub fn height(&self) -> u16 {
        self.get().1
    }
}
