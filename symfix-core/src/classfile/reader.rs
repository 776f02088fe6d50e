//! 类文件读取器
//!
//! 把 `.class` 字节解析为 [`ClassFile`]。只有改写需要的结构（`Code`、
//! `BootstrapMethods`）被展开，其余属性保留原始字节。

use super::constant_pool::ConstantPool;
use super::error::ClassError;

/// 类文件魔数
pub const MAGIC: u32 = 0xCAFE_BABE;

/// 大端字节游标
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(ClassError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, ClassError> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, ClassError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32, ClassError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64(&mut self) -> Result<u64, ClassError> {
        let hi = self.u32()? as u64;
        let lo = self.u32()? as u64;
        Ok((hi << 32) | lo)
    }
}

/// 解析后的类文件
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

/// 字段或方法声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

/// 属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Code(CodeAttribute),
    BootstrapMethods {
        name_index: u16,
        methods: Vec<BootstrapMethod>,
    },
    Raw {
        name_index: u16,
        info: Vec<u8>,
    },
}

/// 方法体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub name_index: u16,
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

/// BootstrapMethods 表中的一项
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BootstrapMethod {
    /// MethodHandle 常量索引
    pub method_ref: u16,
    pub arguments: Vec<u16>,
}

/// 属性所在位置，决定哪些属性名会被展开
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Class,
    Member,
    Code,
}

impl ClassFile {
    /// 解析完整的类文件
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassError> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassError::BadMagic { found: magic });
        }
        let minor_version = reader.u16()?;
        let major_version = reader.u16()?;
        let pool = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.u16()?;
        let this_class = reader.u16()?;
        let super_class = reader.u16()?;

        let interface_count = reader.u16()?;
        let interfaces = (0..interface_count)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>, _>>()?;

        let fields = read_members(&mut reader, &pool)?;
        let methods = read_members(&mut reader, &pool)?;
        let attributes = read_attributes(&mut reader, &pool, Scope::Class)?;

        if reader.remaining() != 0 {
            return Err(ClassError::TrailingBytes {
                len: reader.remaining(),
            });
        }

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// 类自身的内部名
    pub fn name(&self) -> Result<String, ClassError> {
        self.pool.class_name(self.this_class)
    }

    pub fn bootstrap_methods(&self) -> Option<&Vec<BootstrapMethod>> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::BootstrapMethods { methods, .. } => Some(methods),
            _ => None,
        })
    }

    pub fn bootstrap_methods_mut(&mut self) -> Option<&mut Vec<BootstrapMethod>> {
        self.attributes.iter_mut().find_map(|attr| match attr {
            Attribute::BootstrapMethods { methods, .. } => Some(methods),
            _ => None,
        })
    }
}

impl MemberInfo {
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn code_mut(&mut self) -> Option<&mut CodeAttribute> {
        self.attributes.iter_mut().find_map(|attr| match attr {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }
}

fn read_members(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<MemberInfo>, ClassError> {
    let count = reader.u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        members.push(MemberInfo {
            access_flags: reader.u16()?,
            name_index: reader.u16()?,
            descriptor_index: reader.u16()?,
            attributes: read_attributes(reader, pool, Scope::Member)?,
        });
    }
    Ok(members)
}

fn read_attributes(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    scope: Scope,
) -> Result<Vec<Attribute>, ClassError> {
    let count = reader.u16()?;
    let mut attributes = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let name_index = reader.u16()?;
        let len = reader.u32()? as usize;
        let info = reader.bytes(len)?;

        let name = pool.try_utf8(name_index);
        let attribute = match (scope, name.as_deref()) {
            (Scope::Member, Some("Code")) => {
                let mut body = ByteReader::new(info);
                let code = read_code(&mut body, pool, name_index)?;
                ensure_consumed(&body)?;
                Attribute::Code(code)
            }
            (Scope::Class, Some("BootstrapMethods")) => {
                let mut body = ByteReader::new(info);
                let methods = read_bootstrap_methods(&mut body)?;
                ensure_consumed(&body)?;
                Attribute::BootstrapMethods {
                    name_index,
                    methods,
                }
            }
            _ => Attribute::Raw {
                name_index,
                info: info.to_vec(),
            },
        };
        attributes.push(attribute);
    }

    Ok(attributes)
}

fn read_code(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    name_index: u16,
) -> Result<CodeAttribute, ClassError> {
    let max_stack = reader.u16()?;
    let max_locals = reader.u16()?;
    let code_len = reader.u32()? as usize;
    let code = reader.bytes(code_len)?.to_vec();

    let handler_count = reader.u16()?;
    let mut exception_table = Vec::with_capacity(handler_count as usize);
    for _ in 0..handler_count {
        exception_table.push(ExceptionHandler {
            start_pc: reader.u16()?,
            end_pc: reader.u16()?,
            handler_pc: reader.u16()?,
            catch_type: reader.u16()?,
        });
    }

    let attributes = read_attributes(reader, pool, Scope::Code)?;

    Ok(CodeAttribute {
        name_index,
        max_stack,
        max_locals,
        code,
        exception_table,
        attributes,
    })
}

fn read_bootstrap_methods(reader: &mut ByteReader<'_>) -> Result<Vec<BootstrapMethod>, ClassError> {
    let count = reader.u16()?;
    let mut methods = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let method_ref = reader.u16()?;
        let arg_count = reader.u16()?;
        let arguments = (0..arg_count)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>, _>>()?;
        methods.push(BootstrapMethod {
            method_ref,
            arguments,
        });
    }
    Ok(methods)
}

fn ensure_consumed(reader: &ByteReader<'_>) -> Result<(), ClassError> {
    match reader.remaining() {
        0 => Ok(()),
        len => Err(ClassError::TrailingBytes { len }),
    }
}
