//! Symfix Core - Secondary symbol remapping engine (pure logic)
//!
//! Contains the mapping loader, the class-file codec and rewriter, the
//! access-widener rewriter and the streaming archive driver.
//!
//! Configuration is passed explicitly via parameters, not via global state.
//! The only filesystem access lives in [`archive::transaction`].

pub mod archive;
pub mod classfile;
pub mod mapping;
pub mod sidecar;

// Re-export common types
pub use archive::{commit_in_place, rewrite_archive, ArchiveError, ArchiveReport, RemapContext};
pub use classfile::{rewrite_class, ClassError, ClassRewrite};
pub use mapping::{load_dictionary, NamespaceRemapper, RenameDictionary, TinyTree};
pub use sidecar::{rewrite_sidecar, SidecarError};

// Re-export config types from symfix-config
pub use symfix_config::{ArchiveConfig, Namespaces, Phase, RewriteConfig, SidecarPolicy};
