//! Slab storage
//!
//! Fixed-capacity slabs and the growable chain built on top of them. All
//! entity and component storage in the crate goes through these types.

pub mod fixed;
pub mod growable;

pub use fixed::{Slab, SlabIter, SlotIndex, NO_SLOT};
pub use growable::{GrowableSlab, SlotId};
