//! API 层配置
//!
//! 包含执行配置 RunConfig 和全局单例（供 CLI 使用）

use once_cell::sync::OnceCell;
use symfix_config::{ArchiveConfig, Namespaces, RewriteConfig, SidecarPolicy};

/// Remap configuration
#[derive(Clone, Default)]
pub struct RunConfig {
    /// Source / target namespaces
    pub namespaces: Namespaces,
    /// Entry suffixes and temporary sibling suffix
    pub archive: ArchiveConfig,
    /// Class rewriter options
    pub rewrite: RewriteConfig,
    /// What to do with sidecars that fail to parse
    pub sidecar_policy: SidecarPolicy,
    /// Use the tiny tree in the mapping file as the sidecar delegate
    ///
    /// When disabled the first sidecar stage is a no-op.
    pub use_tree_delegate: bool,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("from", &self.namespaces.from)
            .field("to", &self.namespaces.to)
            .field("parallel", &self.rewrite.parallel)
            .field("sidecar_policy", &self.sidecar_policy)
            .field("use_tree_delegate", &self.use_tree_delegate)
            .finish()
    }
}

impl RunConfig {
    /// Default configuration with the tiny-tree delegate enabled
    pub fn new() -> Self {
        Self {
            use_tree_delegate: true,
            ..Default::default()
        }
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize global configuration (must be called once before any operation)
///
/// # Panics
/// If config is already initialized
pub fn init(config: RunConfig) {
    GLOBAL_CONFIG
        .set(config)
        .expect("Config already initialized");
}

/// Get global config reference
///
/// # Panics
/// If config is not initialized
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get().expect("Config not initialized")
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_config() {
        let cfg = RunConfig::new();
        assert!(cfg.use_tree_delegate);
        assert!(cfg.rewrite.parallel);
        assert_eq!(cfg.namespaces.from, "intermediary");
        assert_eq!(cfg.sidecar_policy, SidecarPolicy::PassThrough);
        assert_eq!(cfg.archive.temp_suffix, "_temp");
    }

    #[test]
    fn test_default_disables_delegate() {
        assert!(!RunConfig::default().use_tree_delegate);
    }

    #[test]
    fn test_run_config_debug() {
        let debug_str = format!("{:?}", RunConfig::new());
        assert!(debug_str.contains("from"));
        assert!(debug_str.contains("parallel"));
        assert!(debug_str.contains("PassThrough"));
    }

    #[test]
    fn test_global_config_init_and_get() {
        // 全局状态只能设置一次；已初始化时跳过
        if !is_initialized() {
            init(RunConfig::new());
            assert!(is_initialized());
            assert!(config().use_tree_delegate);
        }
    }
}
