//! 归档事务

pub mod driver;
pub mod transaction;

pub use driver::{rewrite_archive, ArchiveError, ArchiveReport, EntryKind, RemapContext};
pub use transaction::{commit_in_place, temp_path};
