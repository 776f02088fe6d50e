//! 访问扩展文件（`.accesswidener`）

pub mod error;
pub mod model;
pub mod reader;
pub mod remapper;
pub mod rewriter;
mod writer;

pub use error::SidecarError;
pub use model::{AccessKind, AccessWidener, Entry, Target};
pub use reader::parse;
pub use remapper::remap;
pub use rewriter::{apply_dictionary, rewrite_sidecar, SidecarRewrite};
