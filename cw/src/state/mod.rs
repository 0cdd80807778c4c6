//! Watermark and cycle output persistence
//!
//! The poller only talks to [`StateStore`]; file layout is private to
//! [`FileStateStore`].

mod store;

pub use store::{FileStateStore, StateStore, WatermarkFile};

#[cfg(test)]
pub use store::mock::MemoryStateStore;
