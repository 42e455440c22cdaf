//! File-descriptor pagination subsystem (spec §4.B).

pub mod manager;
pub mod pagination;

pub use manager::{FdError, FileDescriptor, FileDescriptorManager, ReadMode, ReadOutcome, WriteMode};
pub use pagination::Page;
