//! 类文件编解码与符号改写

pub mod assembler;
pub mod code;
pub mod constant_pool;
pub mod error;
pub mod mutf8;
pub mod reader;
pub mod rewriter;
mod writer;

pub use assembler::{
    static_handle, Access, BootstrapArgument, ClassAssembler, CodeAssembler, Invoke,
};
pub use code::Instruction;
pub use constant_pool::{Constant, ConstantPool, Handle, MemberRef, RefKind};
pub use error::ClassError;
pub use reader::{Attribute, BootstrapMethod, ClassFile, CodeAttribute, MemberInfo};
pub use rewriter::{rewrite_class, split_owner, ClassRewrite, Rename, RenameKind};
