//! Interior-mutable cost overrides attached to otherwise immutable designs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A shared `f64` cell that can be updated through `&self`.
///
/// Design entities are shared through `Arc` across many chips and packages,
/// and a cost override must be visible to all of them. The value is stored
/// as raw bits so the cell stays `Sync`. It never takes part in equality or
/// hashing.
pub(crate) struct OverrideCell(AtomicU64);

impl OverrideCell {
    pub(crate) fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl fmt::Debug for OverrideCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
