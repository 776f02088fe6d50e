//! Symfix API - Remap orchestration layer
//!
//! Provides the unified remap interface, including:
//! - Input validation (archive path, mappings version, output naming)
//! - Mapping loading and delegate construction
//! - The atomic archive transaction
//! - Unified error handling (SymfixError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `remap_with_config(&request, &config)` API.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use symfix_core::archive::{commit_in_place, temp_path, ArchiveReport, RemapContext};
use symfix_core::mapping::{
    check_direction, load_dictionary, IdentityRemapper, LoadOutcome, MappingError,
    NamespaceRemapper, RenameDictionary, TinyTree,
};

// Re-export config
pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};

// Re-export config types from symfix_config
pub use symfix_config::{ArchiveConfig, LogLevel, Namespaces, Phase, RewriteConfig, SidecarPolicy};

// Re-export error and types
pub mod error;
pub mod types;
pub use error::{ErrorKind, ErrorReport, SymfixError};
pub use types::{RemapOutput, RemapRequest};

// Re-export core
pub use symfix_core;

/// 存放游戏版本依赖的清单条目
pub const MOD_MANIFEST: &str = "fabric.mod.json";

/// Remap an archive with explicit configuration
///
/// This is the recommended API for library users.
#[instrument(target = "symfix::archive", skip_all, fields(input = %request.input.display()))]
pub fn remap_with_config(request: &RemapRequest, config: &RunConfig) -> Result<RemapOutput, SymfixError> {
    if !is_archive(&request.input) {
        return Err(SymfixError::Config(format!(
            "input '{}' is not a readable, non-empty .jar or .zip file",
            request.input.display()
        )));
    }
    if let Some(version) = &request.mappings_version {
        if !is_valid_mappings_version(version) {
            return Err(SymfixError::Config(format!(
                "mappings version '{}' does not match <major>.<minor>.<patch>+build.<n>",
                version
            )));
        }
    }

    // 映射先于任何归档改动加载
    let mappings = load_mappings(&request.mappings, config)?;
    let delegate = load_delegate(&request.mappings, config)?;

    let target = output_target(request)?;
    let report = if target == request.input {
        remap_archive(&target, &mappings.dictionary, delegate.as_ref(), config)?
    } else {
        // 在暂存副本上改写，成功后才替换输出路径
        let staging = temp_path(&target, &config.archive.temp_suffix);
        let result = stage_copy(&request.input, &staging)
            .and_then(|_| remap_archive(&staging, &mappings.dictionary, delegate.as_ref(), config))
            .and_then(|report| {
                fs::rename(&staging, &target).map_err(|source| SymfixError::Io {
                    path: target.clone(),
                    source,
                })?;
                Ok(report)
            });
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result?
    };
    let game_version = detect_game_version(&target)?;

    let name = request
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(target: "symfix::archive", "Finished remapping '{}'!", name);

    Ok(RemapOutput {
        output_path: target,
        report,
        mapping_stats: mappings.stats,
        game_version,
    })
}

/// Load the rename dictionary from a mapping file
pub fn load_mappings(path: &Path, config: &RunConfig) -> Result<LoadOutcome, SymfixError> {
    let file = File::open(path).map_err(|source| SymfixError::MappingsUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let outcome = load_dictionary(BufReader::new(file)).map_err(|source| SymfixError::Mapping {
        path: path.to_path_buf(),
        source,
    })?;
    check_direction(
        outcome.header.as_ref(),
        &config.namespaces.from,
        &config.namespaces.to,
    );
    Ok(outcome)
}

/// Build the delegate used by the first sidecar stage
///
/// Mapping files without a tiny v2 header fall back to the identity delegate.
pub fn load_delegate(
    path: &Path,
    config: &RunConfig,
) -> Result<Box<dyn NamespaceRemapper>, SymfixError> {
    if !config.use_tree_delegate {
        return Ok(Box::new(IdentityRemapper));
    }

    let file = File::open(path).map_err(|source| SymfixError::MappingsUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    match TinyTree::parse(
        BufReader::new(file),
        &config.namespaces.from,
        &config.namespaces.to,
    ) {
        Ok(tree) => {
            debug!(
                target: "symfix::mappings",
                classes = tree.class_count(),
                members = tree.member_count(),
                "using tiny tree delegate"
            );
            Ok(Box::new(tree))
        }
        Err(MappingError::InvalidHeader { .. }) => {
            warn!(
                target: "symfix::mappings",
                "{} has no tiny v2 header, sidecar delegate disabled",
                path.display()
            );
            Ok(Box::new(IdentityRemapper))
        }
        Err(source) => Err(SymfixError::Mapping {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Rewrite the archive at `path` in place
pub fn remap_archive(
    path: &Path,
    dictionary: &RenameDictionary,
    delegate: &dyn NamespaceRemapper,
    config: &RunConfig,
) -> Result<ArchiveReport, SymfixError> {
    let ctx = RemapContext {
        dictionary,
        delegate,
        namespaces: &config.namespaces,
        archive: &config.archive,
        rewrite: &config.rewrite,
        sidecar_policy: config.sidecar_policy,
    };
    Ok(commit_in_place(path, &ctx)?)
}

/// Existing, readable, non-empty regular file named `*.jar` or `*.zip`
pub fn is_archive(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() || meta.len() == 0 || File::open(path).is_err() {
        return false;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".jar") || name.ends_with(".zip")
}

/// `<int>.<int>.<int>+build.<int>`, e.g. `1.20.1+build.10`
pub fn is_valid_mappings_version(version: &str) -> bool {
    fn digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }

    let Some((release, build)) = version.split_once("+build.") else {
        return false;
    };
    let parts: Vec<&str> = release.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| digits(p)) && digits(build)
}

/// Force the output file name to a `.jar` extension
pub fn resolve_output_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let renamed = match name.rfind('.') {
        Some(idx) => format!("{}.jar", &name[..idx]),
        None => format!("{}.jar", name),
    };
    output.with_file_name(renamed)
}

/// Read the game version declared in the archive's mod manifest
///
/// Returns `Ok(None)` when the manifest or the dependency is absent.
pub fn detect_game_version(archive: &Path) -> Result<Option<String>, SymfixError> {
    let io_err = |source| SymfixError::Io {
        path: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(io_err)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let mut text = String::new();
    match zip.by_name(MOD_MANIFEST) {
        Ok(mut entry) => {
            entry.read_to_string(&mut text).map_err(io_err)?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))),
    }

    let manifest: serde_json::Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!(target: "symfix::archive", "ignoring unreadable {}: {}", MOD_MANIFEST, e);
            return Ok(None);
        }
    };

    let version = match manifest.pointer("/depends/minecraft") {
        Some(serde_json::Value::String(v)) => Some(v.clone()),
        Some(serde_json::Value::Array(items)) => {
            items.first().and_then(|v| v.as_str()).map(str::to_string)
        }
        _ => None,
    };
    Ok(version)
}

/// Where the result ends up: the input itself, or the `.jar`-named output
fn output_target(request: &RemapRequest) -> Result<PathBuf, SymfixError> {
    match &request.output {
        None => Ok(request.input.clone()),
        Some(output) if output.as_os_str().is_empty() => {
            Err(SymfixError::Config("output path is empty".to_string()))
        }
        Some(output) => Ok(resolve_output_path(output)),
    }
}

fn stage_copy(input: &Path, staging: &Path) -> Result<(), SymfixError> {
    fs::copy(input, staging).map_err(|source| SymfixError::Io {
        path: staging.to_path_buf(),
        source,
    })?;
    debug!(
        target: "symfix::archive",
        "copied {} to {}",
        input.display(),
        staging.display()
    );
    Ok(())
}

// ==================== Legacy API (using global config) ====================

/// Remap an archive (uses global config)
///
/// # Panics
/// If global config is not initialized
pub fn remap(request: &RemapRequest) -> Result<RemapOutput, SymfixError> {
    remap_with_config(request, get_config())
}
