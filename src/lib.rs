//! Symfix - Secondary symbol remapping for compiled-class archives
//!
//! After a primary namespace remap, a small tiny mapping file is folded into a
//! rename dictionary and applied to every compiled class and access-widener
//! sidecar in an archive. The archive is rewritten through a temporary
//! sibling and replaced atomically.
//!
//! # Architecture
//!
//! ```text
//! symfix-config/  - Pure configuration data
//! symfix-core/    - Mapping loader, class codec, sidecar rewriter, archive driver
//! symfix-api/     - Validation and orchestration (input → output)
//! symfix-cli/     - `symfix` binary, logging setup
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use symfix::{remap_with_config, RemapRequest, RunConfig};
//!
//! let request = RemapRequest::new("mod.jar", "mappings.tiny");
//! let output = remap_with_config(&request, &RunConfig::new())?;
//! println!("{} renames", output.report.renames);
//! ```

pub use symfix_api::*;
