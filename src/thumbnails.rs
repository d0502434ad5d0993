//! Cover thumbnails for listed entries.
//!
//! Rendering lives outside this crate behind [`ThumbnailLoader`]. What lives
//! here is the bookkeeping that keeps a late delivery from landing on a
//! display slot that has since been bound to another entry: every bind bumps
//! the slot's generation and a delivery is only applied when its token still
//! carries the current one.

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// One reusable display position in the list.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SlotId(pub usize);

/// Proof of which binding of a slot a thumbnail request belongs to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SlotToken {
    pub slot: SlotId,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ThumbnailFailure {
    Cancelled,
    Unreadable,
    NoImage,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ThumbnailOutcome {
    /// Rendered image written to this path.
    Success(PathBuf),
    Failed(ThumbnailFailure),
}

/// Produces thumbnails asynchronously and reports back with the token it was given.
pub trait ThumbnailLoader {
    fn load_comic(&self, comic: &Path, token: SlotToken);
    fn load_directory(&self, dir: &Path, token: SlotToken);
}

#[derive(Debug)]
struct SlotBinding {
    generation: u64,
    entry: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ThumbnailSlots {
    slots: Mutex<HashMap<SlotId, SlotBinding>>,
}

impl ThumbnailSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `slot` to `entry`, invalidating tokens handed out earlier.
    pub fn assign(&self, slot: SlotId, entry: &Path) -> SlotToken {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let binding = slots.entry(slot).or_insert(SlotBinding {
            generation: 0,
            entry: None,
        });
        binding.generation += 1;
        binding.entry = Some(entry.to_path_buf());
        SlotToken {
            slot,
            generation: binding.generation,
        }
    }

    /// Unbinds `slot`; pending deliveries for it become stale.
    pub fn release(&self, slot: SlotId) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(binding) = slots.get_mut(&slot) {
            binding.generation += 1;
            binding.entry = None;
        }
    }

    pub fn bound_entry(&self, slot: SlotId) -> Option<PathBuf> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(&slot).and_then(|b| b.entry.clone())
    }

    pub fn is_current(&self, token: SlotToken) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&token.slot)
            .map(|b| b.generation == token.generation && b.entry.is_some())
            .unwrap_or(false)
    }

    /// Returns the image to show when `outcome` may be applied to its slot.
    pub fn accept(&self, token: SlotToken, outcome: ThumbnailOutcome) -> Option<PathBuf> {
        if !self.is_current(token) {
            debug!("dropping stale thumbnail for slot {:?} (generation {})", token.slot, token.generation);
            return None;
        }
        match outcome {
            ThumbnailOutcome::Success(image)
                if !image.as_os_str().is_empty() && image.exists() =>
            {
                Some(image)
            }
            other => {
                debug!("thumbnail not applied to slot {:?}: {other:?}", token.slot);
                None
            }
        }
    }
}
