//! 指令解码
//!
//! 把方法体字节切分为有序的指令列表。只区分改写关心的指令：
//! 成员访问 / 调用、invokedynamic、字符串常量加载，其余统一为 [`Instruction::Other`]。
//!
//! 改写只替换 2 字节（或 1 字节）常量池操作数，指令宽度不变，
//! 所以偏移、跳转目标、异常表和栈映射都无需调整。

use super::error::ClassError;

pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const GETSTATIC: u8 = 0xb2;
pub const PUTSTATIC: u8 = 0xb3;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const RETURN: u8 = 0xb1;
pub const ALOAD_0: u8 = 0x2a;
pub const POP: u8 = 0x57;

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

/// 一条指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// getstatic / putstatic / getfield / putfield / invoke{virtual,special,static,interface}
    Member { offset: usize, opcode: u8, index: u16 },
    /// invokedynamic
    InvokeDynamic { offset: usize, index: u16 },
    /// ldc / ldc_w，`wide` 为 false 时操作数只有 1 字节
    Ldc { offset: usize, index: u16, wide: bool },
    /// 其他指令
    Other { offset: usize, opcode: u8, len: usize },
}

impl Instruction {
    pub fn offset(&self) -> usize {
        match *self {
            Instruction::Member { offset, .. }
            | Instruction::InvokeDynamic { offset, .. }
            | Instruction::Ldc { offset, .. }
            | Instruction::Other { offset, .. } => offset,
        }
    }

    /// 常量池操作数（没有时为 `None`）
    pub fn constant_index(&self) -> Option<u16> {
        match *self {
            Instruction::Member { index, .. }
            | Instruction::InvokeDynamic { index, .. }
            | Instruction::Ldc { index, .. } => Some(index),
            Instruction::Other { .. } => None,
        }
    }

    /// 同一位置、同一操作码，换一个常量池操作数
    pub fn with_index(self, index: u16) -> Self {
        match self {
            Instruction::Member { offset, opcode, .. } => Instruction::Member {
                offset,
                opcode,
                index,
            },
            Instruction::InvokeDynamic { offset, .. } => Instruction::InvokeDynamic { offset, index },
            Instruction::Ldc { offset, wide, .. } => Instruction::Ldc {
                offset,
                index,
                wide,
            },
            other => other,
        }
    }

    /// 把操作数写回方法体
    pub fn encode_operand(&self, code: &mut [u8]) {
        match *self {
            Instruction::Member { offset, index, .. }
            | Instruction::InvokeDynamic { offset, index }
            | Instruction::Ldc {
                offset,
                index,
                wide: true,
            } => {
                code[offset + 1..offset + 3].copy_from_slice(&index.to_be_bytes());
            }
            Instruction::Ldc {
                offset,
                index,
                wide: false,
            } => code[offset + 1] = index as u8,
            Instruction::Other { .. } => {}
        }
    }
}

/// 解码整个方法体
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>, ClassError> {
    let mut instructions = Vec::new();
    let mut offset = 0;

    while offset < code.len() {
        let opcode = code[offset];
        let len = instruction_length(code, offset)?;
        if offset + len > code.len() {
            return Err(ClassError::UnexpectedEof { offset });
        }

        let instruction = match opcode {
            GETSTATIC..=INVOKEINTERFACE => Instruction::Member {
                offset,
                opcode,
                index: read_u16(code, offset + 1),
            },
            INVOKEDYNAMIC => Instruction::InvokeDynamic {
                offset,
                index: read_u16(code, offset + 1),
            },
            LDC => Instruction::Ldc {
                offset,
                index: code[offset + 1] as u16,
                wide: false,
            },
            LDC_W => Instruction::Ldc {
                offset,
                index: read_u16(code, offset + 1),
                wide: true,
            },
            _ => Instruction::Other { offset, opcode, len },
        };
        instructions.push(instruction);
        offset += len;
    }

    Ok(instructions)
}

/// 指令总长度（含操作码）
pub fn instruction_length(code: &[u8], offset: usize) -> Result<usize, ClassError> {
    let opcode = code[offset];
    let len = match opcode {
        0x00..=0x0f | 0x1a..=0x35 | 0x3b..=0x83 | 0x85..=0x98 | 0xac..=0xb1 => 1,
        0xbe | 0xbf | 0xc2 | 0xc3 | 0xca | 0xfe | 0xff => 1,
        0x10 | LDC | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => 2,
        0x11 | LDC_W | 0x14 | IINC | 0x99..=0xa8 | GETSTATIC..=INVOKESTATIC => 3,
        0xbb | 0xbd | 0xc0 | 0xc1 | 0xc6 | 0xc7 => 3,
        0xc5 => 4,
        INVOKEINTERFACE | INVOKEDYNAMIC | 0xc8 | 0xc9 => 5,
        WIDE => match code.get(offset + 1) {
            Some(&IINC) => 6,
            Some(_) => 4,
            None => return Err(ClassError::UnexpectedEof { offset }),
        },
        TABLESWITCH => {
            let base = offset + 1 + switch_padding(offset);
            let low = read_i32(code, base + 4, offset)?;
            let high = read_i32(code, base + 8, offset)?;
            let entries = (high as i64) - (low as i64) + 1;
            if entries < 0 {
                return Err(ClassError::InvalidInstruction { opcode, offset });
            }
            1 + switch_padding(offset) + 12 + entries as usize * 4
        }
        LOOKUPSWITCH => {
            let base = offset + 1 + switch_padding(offset);
            let pairs = read_i32(code, base + 4, offset)?;
            if pairs < 0 {
                return Err(ClassError::InvalidInstruction { opcode, offset });
            }
            1 + switch_padding(offset) + 8 + pairs as usize * 8
        }
        _ => return Err(ClassError::InvalidInstruction { opcode, offset }),
    };
    Ok(len)
}

/// switch 操作码之后对齐到 4 字节的填充
fn switch_padding(offset: usize) -> usize {
    (4 - (offset + 1) % 4) % 4
}

fn read_u16(code: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([code[at], code[at + 1]])
}

fn read_i32(code: &[u8], at: usize, offset: usize) -> Result<i32, ClassError> {
    code.get(at..at + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ClassError::UnexpectedEof { offset })
}
