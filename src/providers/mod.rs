//! Record sources.
//!
//! The dispatch engine pulls records through the [`RecordSource`] trait. This
//! module defines the trait and ships [`InMemoryRecordSource`], a catalog held
//! in memory that is useful for tests, demos and small static repositories.

pub mod in_memory;
pub mod provider;

pub use in_memory::{InMemoryRecordSource, InMemorySourceStats};
pub use provider::RecordSource;
