//! Persistence owned by the scheduling engine.
//!
//! The only persisted state is the monotonic id counter of the delegating
//! backend; everything else is recomputed or externally owned.

pub mod counter_store;

pub use counter_store::FileCounterStore;
