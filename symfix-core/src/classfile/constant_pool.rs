//! 常量池
//!
//! 常量按原始形态保存（Utf8 为原始 modified UTF-8 字节，浮点数为原始位），
//! 未改动的常量池可以逐字节还原。
//!
//! 改写从不修改已有常量：新常量通过 `intern_*` 追加（相同常量复用），
//! 引用方改为指向新索引。Long / Double 占两个槽位，第二个槽位为 [`Constant::Unusable`]。

use std::collections::HashMap;

use super::error::ClassError;
use super::mutf8;
use super::reader::ByteReader;

/// 常量池条目
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Utf8(Vec<u8>),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    Fieldref { class: u16, name_and_type: u16 },
    Methodref { class: u16, name_and_type: u16 },
    InterfaceMethodref { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType(u16),
    Dynamic { bootstrap: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap: u16, name_and_type: u16 },
    Module(u16),
    Package(u16),
    /// 索引 0 以及 Long / Double 之后的槽位
    Unusable,
}

impl Constant {
    pub fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) => 1,
            Constant::Integer(_) => 3,
            Constant::Float(_) => 4,
            Constant::Long(_) => 5,
            Constant::Double(_) => 6,
            Constant::Class(_) => 7,
            Constant::String(_) => 8,
            Constant::Fieldref { .. } => 9,
            Constant::Methodref { .. } => 10,
            Constant::InterfaceMethodref { .. } => 11,
            Constant::NameAndType { .. } => 12,
            Constant::MethodHandle { .. } => 15,
            Constant::MethodType(_) => 16,
            Constant::Dynamic { .. } => 17,
            Constant::InvokeDynamic { .. } => 18,
            Constant::Module(_) => 19,
            Constant::Package(_) => 20,
            Constant::Unusable => 0,
        }
    }

    /// 占用的槽位数
    pub fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// 成员引用种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Field,
    Method,
    InterfaceMethod,
}

/// 解析后的成员引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub kind: RefKind,
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// 解析后的方法句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    /// reference_kind（1..=9）
    pub tag: u8,
    pub member: MemberRef,
}

/// 常量池
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// 下标即常量索引，`entries[0]` 为占位
    entries: Vec<Constant>,
    /// 常量到首次出现位置的索引，用于复用
    lookup: HashMap<Constant, u16>,
}

impl ConstantPool {
    /// 创建空常量池（仅含占位槽）
    pub fn new() -> Self {
        Self {
            entries: vec![Constant::Unusable],
            lookup: HashMap::new(),
        }
    }

    /// 读取 `constant_pool_count` 及全部条目
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, ClassError> {
        let count = reader.u16()?;
        let mut pool = Self::new();

        let mut index: u16 = 1;
        while index < count {
            let tag = reader.u8()?;
            let constant = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    Constant::Utf8(reader.bytes(len)?.to_vec())
                }
                3 => Constant::Integer(reader.u32()? as i32),
                4 => Constant::Float(reader.u32()?),
                5 => Constant::Long(reader.u64()? as i64),
                6 => Constant::Double(reader.u64()?),
                7 => Constant::Class(reader.u16()?),
                8 => Constant::String(reader.u16()?),
                9 => Constant::Fieldref {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                10 => Constant::Methodref {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                11 => Constant::InterfaceMethodref {
                    class: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                12 => Constant::NameAndType {
                    name: reader.u16()?,
                    descriptor: reader.u16()?,
                },
                15 => Constant::MethodHandle {
                    kind: reader.u8()?,
                    reference: reader.u16()?,
                },
                16 => Constant::MethodType(reader.u16()?),
                17 => Constant::Dynamic {
                    bootstrap: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap: reader.u16()?,
                    name_and_type: reader.u16()?,
                },
                19 => Constant::Module(reader.u16()?),
                20 => Constant::Package(reader.u16()?),
                _ => return Err(ClassError::InvalidConstantTag { tag, index }),
            };

            let width = constant.width();
            pool.lookup.entry(constant.clone()).or_insert(index);
            pool.entries.push(constant);
            if width == 2 {
                pool.entries.push(Constant::Unusable);
            }
            index = index.saturating_add(width as u16);
        }

        Ok(pool)
    }

    /// 写出 `constant_pool_count` 及全部条目
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.count().to_be_bytes());
        for constant in &self.entries[1..] {
            let tag = constant.tag();
            if tag == 0 {
                continue;
            }
            out.push(tag);
            match constant {
                Constant::Utf8(bytes) => {
                    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    out.extend_from_slice(bytes);
                }
                Constant::Integer(v) => out.extend_from_slice(&v.to_be_bytes()),
                Constant::Float(bits) => out.extend_from_slice(&bits.to_be_bytes()),
                Constant::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
                Constant::Double(bits) => out.extend_from_slice(&bits.to_be_bytes()),
                Constant::Class(i)
                | Constant::String(i)
                | Constant::MethodType(i)
                | Constant::Module(i)
                | Constant::Package(i) => out.extend_from_slice(&i.to_be_bytes()),
                Constant::Fieldref { class, name_and_type }
                | Constant::Methodref { class, name_and_type }
                | Constant::InterfaceMethodref { class, name_and_type } => {
                    out.extend_from_slice(&class.to_be_bytes());
                    out.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Constant::NameAndType { name, descriptor } => {
                    out.extend_from_slice(&name.to_be_bytes());
                    out.extend_from_slice(&descriptor.to_be_bytes());
                }
                Constant::MethodHandle { kind, reference } => {
                    out.push(*kind);
                    out.extend_from_slice(&reference.to_be_bytes());
                }
                Constant::Dynamic {
                    bootstrap,
                    name_and_type,
                }
                | Constant::InvokeDynamic {
                    bootstrap,
                    name_and_type,
                } => {
                    out.extend_from_slice(&bootstrap.to_be_bytes());
                    out.extend_from_slice(&name_and_type.to_be_bytes());
                }
                Constant::Unusable => {}
            }
        }
    }

    /// `constant_pool_count`（最大索引 + 1）
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ClassError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassError::InvalidConstantIndex { index }),
            Some(constant) => Ok(constant),
        }
    }

    /// 解码 Utf8 常量
    pub fn utf8(&self, index: u16) -> Result<String, ClassError> {
        match self.get(index)? {
            Constant::Utf8(bytes) => {
                mutf8::decode(bytes).ok_or(ClassError::InvalidUtf8 { index })
            }
            _ => Err(unexpected(index, "Utf8")),
        }
    }

    /// 解码 Utf8 常量，失败时返回 `None`
    pub fn try_utf8(&self, index: u16) -> Option<String> {
        match self.entries.get(index as usize)? {
            Constant::Utf8(bytes) => mutf8::decode(bytes),
            _ => None,
        }
    }

    /// Class 常量的内部名
    pub fn class_name(&self, index: u16) -> Result<String, ClassError> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8(*name),
            _ => Err(unexpected(index, "Class")),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(String, String), ClassError> {
        match self.get(index)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(unexpected(index, "NameAndType")),
        }
    }

    /// 解析 Fieldref / Methodref / InterfaceMethodref
    pub fn member_ref(&self, index: u16) -> Result<MemberRef, ClassError> {
        let (kind, class, name_and_type) = match self.get(index)? {
            Constant::Fieldref {
                class,
                name_and_type,
            } => (RefKind::Field, *class, *name_and_type),
            Constant::Methodref {
                class,
                name_and_type,
            } => (RefKind::Method, *class, *name_and_type),
            Constant::InterfaceMethodref {
                class,
                name_and_type,
            } => (RefKind::InterfaceMethod, *class, *name_and_type),
            _ => return Err(unexpected(index, "member reference")),
        };
        let (name, descriptor) = self.name_and_type(name_and_type)?;
        Ok(MemberRef {
            kind,
            owner: self.class_name(class)?,
            name,
            descriptor,
        })
    }

    pub fn method_handle(&self, index: u16) -> Result<Handle, ClassError> {
        match self.get(index)? {
            Constant::MethodHandle { kind, reference } => Ok(Handle {
                tag: *kind,
                member: self.member_ref(*reference)?,
            }),
            _ => Err(unexpected(index, "MethodHandle")),
        }
    }

    /// InvokeDynamic 常量的 (bootstrap 下标, NameAndType 索引)
    pub fn invoke_dynamic(&self, index: u16) -> Result<(u16, u16), ClassError> {
        match self.get(index)? {
            Constant::InvokeDynamic {
                bootstrap,
                name_and_type,
            } => Ok((*bootstrap, *name_and_type)),
            _ => Err(unexpected(index, "InvokeDynamic")),
        }
    }

    /// String 常量的字面值，非 String 或无法解码时返回 `None`
    pub fn string_value(&self, index: u16) -> Option<String> {
        match self.entries.get(index as usize)? {
            Constant::String(utf8) => self.try_utf8(*utf8),
            _ => None,
        }
    }

    /// 追加常量，已存在时复用
    pub fn intern(&mut self, constant: Constant) -> Result<u16, ClassError> {
        if let Some(&index) = self.lookup.get(&constant) {
            return Ok(index);
        }

        let width = constant.width();
        if self.entries.len() + width > u16::MAX as usize {
            return Err(ClassError::ConstantPoolOverflow);
        }

        let index = self.entries.len() as u16;
        self.lookup.insert(constant.clone(), index);
        self.entries.push(constant);
        if width == 2 {
            self.entries.push(Constant::Unusable);
        }
        Ok(index)
    }

    pub fn intern_utf8(&mut self, text: &str) -> Result<u16, ClassError> {
        self.intern(Constant::Utf8(mutf8::encode(text)))
    }

    pub fn intern_class(&mut self, name: &str) -> Result<u16, ClassError> {
        let name = self.intern_utf8(name)?;
        self.intern(Constant::Class(name))
    }

    pub fn intern_string(&mut self, value: &str) -> Result<u16, ClassError> {
        let utf8 = self.intern_utf8(value)?;
        self.intern(Constant::String(utf8))
    }

    pub fn intern_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, ClassError> {
        let name = self.intern_utf8(name)?;
        let descriptor = self.intern_utf8(descriptor)?;
        self.intern(Constant::NameAndType { name, descriptor })
    }

    pub fn intern_member_ref(&mut self, member: &MemberRef) -> Result<u16, ClassError> {
        let class = self.intern_class(&member.owner)?;
        let name_and_type = self.intern_name_and_type(&member.name, &member.descriptor)?;
        self.intern(match member.kind {
            RefKind::Field => Constant::Fieldref {
                class,
                name_and_type,
            },
            RefKind::Method => Constant::Methodref {
                class,
                name_and_type,
            },
            RefKind::InterfaceMethod => Constant::InterfaceMethodref {
                class,
                name_and_type,
            },
        })
    }

    pub fn intern_method_handle(&mut self, handle: &Handle) -> Result<u16, ClassError> {
        let reference = self.intern_member_ref(&handle.member)?;
        self.intern(Constant::MethodHandle {
            kind: handle.tag,
            reference,
        })
    }

    pub fn intern_invoke_dynamic(
        &mut self,
        bootstrap: u16,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassError> {
        let name_and_type = self.intern_name_and_type(name, descriptor)?;
        self.intern(Constant::InvokeDynamic {
            bootstrap,
            name_and_type,
        })
    }

    /// 让已有的 String 常量指向新文本
    ///
    /// 只用于单字节 `ldc` 操作数无法容纳新索引的情况。
    pub fn repoint_string(&mut self, index: u16, value: &str) -> Result<(), ClassError> {
        if !matches!(self.get(index)?, Constant::String(_)) {
            return Err(unexpected(index, "String"));
        }
        let utf8 = self.intern_utf8(value)?;
        let old = std::mem::replace(&mut self.entries[index as usize], Constant::String(utf8));
        if self.lookup.get(&old) == Some(&index) {
            self.lookup.remove(&old);
        }
        self.lookup.entry(Constant::String(utf8)).or_insert(index);
        Ok(())
    }
}

fn unexpected(index: u16, expected: &'static str) -> ClassError {
    ClassError::UnexpectedConstant { index, expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConstantPool {
        let mut pool = ConstantPool::new();
        pool.intern_member_ref(&MemberRef {
            kind: RefKind::Method,
            owner: "a/b/Old".to_string(),
            name: "method_1".to_string(),
            descriptor: "()V".to_string(),
        })
        .unwrap();
        pool.intern(Constant::Long(42)).unwrap();
        pool.intern_string("hello").unwrap();
        pool
    }

    #[test]
    fn test_interning_reuses_constants() {
        let mut pool = sample();
        let count = pool.count();
        let a = pool.intern_utf8("method_1").unwrap();
        let b = pool.intern_class("a/b/Old").unwrap();
        assert_eq!(pool.count(), count);
        assert_eq!(pool.utf8(a).unwrap(), "method_1");
        assert_eq!(pool.class_name(b).unwrap(), "a/b/Old");
    }

    #[test]
    fn test_long_takes_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.intern(Constant::Long(1)).unwrap();
        let next = pool.intern_utf8("x").unwrap();
        assert_eq!(next, long + 2);
        assert!(matches!(
            pool.get(long + 1),
            Err(ClassError::InvalidConstantIndex { .. })
        ));
    }

    #[test]
    fn test_parse_write_round_trip() {
        let pool = sample();
        let mut bytes = Vec::new();
        pool.write(&mut bytes);

        let mut reader = ByteReader::new(&bytes);
        let parsed = ConstantPool::parse(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);

        let mut again = Vec::new();
        parsed.write(&mut again);
        assert_eq!(bytes, again);
        assert_eq!(parsed.count(), pool.count());
    }

    #[test]
    fn test_member_ref_resolution() {
        let pool = sample();
        let index = (1..pool.count())
            .find(|&i| matches!(pool.get(i), Ok(Constant::Methodref { .. })))
            .unwrap();
        let member = pool.member_ref(index).unwrap();
        assert_eq!(member.owner, "a/b/Old");
        assert_eq!(member.name, "method_1");
        assert_eq!(member.kind, RefKind::Method);
        assert!(matches!(
            pool.class_name(index),
            Err(ClassError::UnexpectedConstant { expected: "Class", .. })
        ));
    }

    #[test]
    fn test_repoint_string() {
        let mut pool = sample();
        let index = pool.intern_string("hello").unwrap();
        pool.repoint_string(index, "world").unwrap();
        assert_eq!(pool.string_value(index).as_deref(), Some("world"));
        assert_eq!(pool.intern_string("world").unwrap(), index);
    }

    #[test]
    fn test_invalid_tag() {
        let bytes = [0x00, 0x02, 0x02, 0x00];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(
            ConstantPool::parse(&mut reader).unwrap_err(),
            ClassError::InvalidConstantTag { tag: 2, index: 1 }
        );
    }
}
