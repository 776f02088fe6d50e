//! 类文件解析 / 改写错误

use thiserror::Error;

/// 结构性解析错误
///
/// 任何一个变体都意味着该类条目无法安全改写，整个归档事务随之中止。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassError {
    #[error("bad magic 0x{found:08X}, not a class file")]
    BadMagic { found: u32 },

    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("{len} trailing bytes after class body")]
    TrailingBytes { len: usize },

    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },

    #[error("constant {index} is not a {expected}")]
    UnexpectedConstant { index: u16, expected: &'static str },

    #[error("invalid constant tag {tag} at index {index}")]
    InvalidConstantTag { tag: u8, index: u16 },

    #[error("constant {index} is not valid modified UTF-8")]
    InvalidUtf8 { index: u16 },

    #[error("invalid opcode 0x{opcode:02X} at code offset {offset}")]
    InvalidInstruction { opcode: u8, offset: usize },

    #[error("invokedynamic present but class has no BootstrapMethods attribute")]
    MissingBootstrapMethods,

    #[error("bootstrap method index {index} out of range")]
    BootstrapIndexOutOfRange { index: u16 },

    #[error("constant pool exceeds 65535 entries")]
    ConstantPoolOverflow,
}
