//! 映射表
//!
//! - [`RenameDictionary`]：裸名字典，驱动类文件改写和访问扩展文件的第二阶段
//! - [`TinyTree`]：按命名空间组织的层级映射，作为第一阶段委托

pub mod delegate;
pub mod dictionary;
pub mod loader;
pub mod tree;

pub use delegate::{IdentityRemapper, NamespaceRemapper};
pub use dictionary::RenameDictionary;
pub use loader::{
    check_direction, load_dictionary, Exclusion, LoadOutcome, LoadStats, MappingError,
    MappingHeader, MappingRecord,
};
pub use tree::TinyTree;
