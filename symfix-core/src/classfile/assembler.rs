//! 类文件汇编器
//!
//! 以声明式的方式描述一个类（字段、方法、与改名相关的指令），
//! 在 [`ClassAssembler::finish`] 时统一分配常量并生成合法的 `.class` 字节。
//! 主要用于测试和样例归档。
//!
//! ```ignore
//! let mut code = CodeAssembler::new();
//! code.aload_0()
//!     .invoke(Invoke::Virtual, "pkg/A", "doX", "()V")
//!     .return_void();
//!
//! let mut class = ClassAssembler::new("pkg/A");
//! class.method(ACC_PUBLIC, "doX", "()V", code);
//! let bytes = class.finish()?;
//! ```

use super::code::{
    ALOAD_0, GETFIELD, GETSTATIC, INVOKEDYNAMIC, INVOKEINTERFACE, INVOKESPECIAL, INVOKESTATIC,
    INVOKEVIRTUAL, LDC, LDC_W, POP, PUTFIELD, PUTSTATIC, RETURN,
};
use super::constant_pool::{Constant, ConstantPool, Handle, MemberRef, RefKind};
use super::error::ClassError;
use super::reader::{Attribute, BootstrapMethod, ClassFile, CodeAttribute, MemberInfo};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;

/// 方法句柄种类
pub const REF_INVOKE_STATIC: u8 = 6;
pub const REF_INVOKE_VIRTUAL: u8 = 5;

/// 调用指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invoke {
    Virtual,
    Special,
    Static,
    Interface,
}

/// 字段访问指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    GetStatic,
    PutStatic,
    GetField,
    PutField,
}

/// bootstrap 方法的静态参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapArgument {
    String(String),
    Integer(i32),
    MethodType(String),
    Handle(Handle),
}

#[derive(Debug, Clone)]
enum Op {
    Raw(Vec<u8>),
    Member {
        opcode: u8,
        member: MemberRef,
    },
    Ldc {
        value: String,
        wide: bool,
    },
    InvokeDynamic {
        name: String,
        descriptor: String,
        bootstrap: Handle,
        arguments: Vec<BootstrapArgument>,
    },
}

/// 方法体汇编器
#[derive(Debug, Clone)]
pub struct CodeAssembler {
    ops: Vec<Op>,
    max_stack: u16,
    max_locals: u16,
}

impl Default for CodeAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeAssembler {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            max_stack: 4,
            max_locals: 1,
        }
    }

    pub fn max(&mut self, stack: u16, locals: u16) -> &mut Self {
        self.max_stack = stack;
        self.max_locals = locals;
        self
    }

    /// 原样写入字节（任意不涉及常量池的指令）
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.ops.push(Op::Raw(bytes.to_vec()));
        self
    }

    pub fn aload_0(&mut self) -> &mut Self {
        self.raw(&[ALOAD_0])
    }

    pub fn pop(&mut self) -> &mut Self {
        self.raw(&[POP])
    }

    pub fn return_void(&mut self) -> &mut Self {
        self.raw(&[RETURN])
    }

    pub fn invoke(&mut self, kind: Invoke, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let (opcode, ref_kind) = match kind {
            Invoke::Virtual => (INVOKEVIRTUAL, RefKind::Method),
            Invoke::Special => (INVOKESPECIAL, RefKind::Method),
            Invoke::Static => (INVOKESTATIC, RefKind::Method),
            Invoke::Interface => (INVOKEINTERFACE, RefKind::InterfaceMethod),
        };
        self.ops.push(Op::Member {
            opcode,
            member: member(ref_kind, owner, name, descriptor),
        });
        self
    }

    pub fn field(&mut self, access: Access, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        let opcode = match access {
            Access::GetStatic => GETSTATIC,
            Access::PutStatic => PUTSTATIC,
            Access::GetField => GETFIELD,
            Access::PutField => PUTFIELD,
        };
        self.ops.push(Op::Member {
            opcode,
            member: member(RefKind::Field, owner, name, descriptor),
        });
        self
    }

    /// 加载字符串常量，索引不超过 255 时使用单字节 `ldc`
    pub fn ldc(&mut self, value: &str) -> &mut Self {
        self.ops.push(Op::Ldc {
            value: value.to_string(),
            wide: false,
        });
        self
    }

    /// 总是使用 `ldc_w`
    pub fn ldc_w(&mut self, value: &str) -> &mut Self {
        self.ops.push(Op::Ldc {
            value: value.to_string(),
            wide: true,
        });
        self
    }

    pub fn invokedynamic(
        &mut self,
        name: &str,
        descriptor: &str,
        bootstrap: Handle,
        arguments: Vec<BootstrapArgument>,
    ) -> &mut Self {
        self.ops.push(Op::InvokeDynamic {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            bootstrap,
            arguments,
        });
        self
    }
}

#[derive(Debug, Clone)]
struct MethodDef {
    access: u16,
    name: String,
    descriptor: String,
    code: Option<CodeAssembler>,
}

/// 类汇编器
#[derive(Debug, Clone)]
pub struct ClassAssembler {
    name: String,
    super_name: String,
    access: u16,
    major_version: u16,
    interfaces: Vec<String>,
    /// (访问标志, 名称, 描述符, 字符串常量值)
    fields: Vec<(u16, String, String, Option<String>)>,
    methods: Vec<MethodDef>,
    strings: Vec<String>,
    source_file: Option<String>,
}

impl ClassAssembler {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: "java/lang/Object".to_string(),
            access: ACC_PUBLIC | ACC_SUPER,
            major_version: 52,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            strings: Vec::new(),
            source_file: None,
        }
    }

    pub fn super_class(&mut self, name: &str) -> &mut Self {
        self.super_name = name.to_string();
        self
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn field(&mut self, access: u16, name: &str, descriptor: &str) -> &mut Self {
        self.fields
            .push((access, name.to_string(), descriptor.to_string(), None));
        self
    }

    /// 带 `ConstantValue` 字符串常量的字段
    pub fn constant_field(&mut self, access: u16, name: &str, descriptor: &str, value: &str) -> &mut Self {
        self.fields.push((
            access,
            name.to_string(),
            descriptor.to_string(),
            Some(value.to_string()),
        ));
        self
    }

    /// 带方法体的方法
    pub fn method(&mut self, access: u16, name: &str, descriptor: &str, code: CodeAssembler) -> &mut Self {
        self.methods.push(MethodDef {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code: Some(code),
        });
        self
    }

    /// 没有方法体的方法（abstract / native）
    pub fn abstract_method(&mut self, access: u16, name: &str, descriptor: &str) -> &mut Self {
        self.methods.push(MethodDef {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code: None,
        });
        self
    }

    /// 预先放入常量池的字符串常量（先于方法体分配）
    pub fn string_constant(&mut self, value: &str) -> &mut Self {
        self.strings.push(value.to_string());
        self
    }

    /// 添加 `SourceFile` 属性（以原始字节保存）
    pub fn source_file(&mut self, name: &str) -> &mut Self {
        self.source_file = Some(name.to_string());
        self
    }

    /// 分配常量并生成类文件字节
    pub fn finish(&self) -> Result<Vec<u8>, ClassError> {
        let mut pool = ConstantPool::new();
        let this_class = pool.intern_class(&self.name)?;
        let super_class = pool.intern_class(&self.super_name)?;
        let interfaces = self
            .interfaces
            .iter()
            .map(|name| pool.intern_class(name))
            .collect::<Result<Vec<_>, _>>()?;
        for value in &self.strings {
            pool.intern_string(value)?;
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for (access, name, descriptor, value) in &self.fields {
            let mut attributes = Vec::new();
            if let Some(value) = value {
                let name_index = pool.intern_utf8("ConstantValue")?;
                let constant = pool.intern_string(value)?;
                attributes.push(Attribute::Raw {
                    name_index,
                    info: constant.to_be_bytes().to_vec(),
                });
            }
            fields.push(MemberInfo {
                access_flags: *access,
                name_index: pool.intern_utf8(name)?,
                descriptor_index: pool.intern_utf8(descriptor)?,
                attributes,
            });
        }

        let mut bootstraps = Vec::new();
        let mut methods = Vec::with_capacity(self.methods.len());
        for def in &self.methods {
            let name_index = pool.intern_utf8(&def.name)?;
            let descriptor_index = pool.intern_utf8(&def.descriptor)?;
            let mut attributes = Vec::new();
            if let Some(code) = &def.code {
                let code_name = pool.intern_utf8("Code")?;
                attributes.push(Attribute::Code(CodeAttribute {
                    name_index: code_name,
                    max_stack: code.max_stack,
                    max_locals: code.max_locals,
                    code: assemble(code, &mut pool, &mut bootstraps)?,
                    exception_table: Vec::new(),
                    attributes: Vec::new(),
                }));
            }
            methods.push(MemberInfo {
                access_flags: def.access,
                name_index,
                descriptor_index,
                attributes,
            });
        }

        let mut attributes = Vec::new();
        if let Some(source) = &self.source_file {
            let name_index = pool.intern_utf8("SourceFile")?;
            let value = pool.intern_utf8(source)?;
            attributes.push(Attribute::Raw {
                name_index,
                info: value.to_be_bytes().to_vec(),
            });
        }
        if !bootstraps.is_empty() {
            attributes.push(Attribute::BootstrapMethods {
                name_index: pool.intern_utf8("BootstrapMethods")?,
                methods: bootstraps,
            });
        }

        let class = ClassFile {
            minor_version: 0,
            major_version: self.major_version,
            pool,
            access_flags: self.access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        Ok(class.to_bytes())
    }
}

fn assemble(
    code: &CodeAssembler,
    pool: &mut ConstantPool,
    bootstraps: &mut Vec<BootstrapMethod>,
) -> Result<Vec<u8>, ClassError> {
    let mut out = Vec::new();
    for op in &code.ops {
        match op {
            Op::Raw(bytes) => out.extend_from_slice(bytes),
            Op::Member { opcode, member } => {
                let index = pool.intern_member_ref(member)?;
                out.push(*opcode);
                out.extend_from_slice(&index.to_be_bytes());
                if *opcode == INVOKEINTERFACE {
                    out.push(argument_slots(&member.descriptor) + 1);
                    out.push(0);
                }
            }
            Op::Ldc { value, wide } => {
                let index = pool.intern_string(value)?;
                if !wide && index <= u8::MAX as u16 {
                    out.push(LDC);
                    out.push(index as u8);
                } else {
                    out.push(LDC_W);
                    out.extend_from_slice(&index.to_be_bytes());
                }
            }
            Op::InvokeDynamic {
                name,
                descriptor,
                bootstrap,
                arguments,
            } => {
                let method_ref = pool.intern_method_handle(bootstrap)?;
                let arguments = arguments
                    .iter()
                    .map(|arg| match arg {
                        BootstrapArgument::String(value) => pool.intern_string(value),
                        BootstrapArgument::Integer(value) => pool.intern(Constant::Integer(*value)),
                        BootstrapArgument::MethodType(descriptor) => {
                            let utf8 = pool.intern_utf8(descriptor)?;
                            pool.intern(Constant::MethodType(utf8))
                        }
                        BootstrapArgument::Handle(handle) => pool.intern_method_handle(handle),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let entry = BootstrapMethod {
                    method_ref,
                    arguments,
                };
                let bootstrap = match bootstraps.iter().position(|m| *m == entry) {
                    Some(existing) => existing,
                    None => {
                        bootstraps.push(entry);
                        bootstraps.len() - 1
                    }
                };
                let index = pool.intern_invoke_dynamic(bootstrap as u16, name, descriptor)?;
                out.push(INVOKEDYNAMIC);
                out.extend_from_slice(&index.to_be_bytes());
                out.extend_from_slice(&[0, 0]);
            }
        }
    }
    Ok(out)
}

/// 参数占用的局部变量槽位数（long / double 占 2 个）
fn argument_slots(descriptor: &str) -> u8 {
    let params = descriptor
        .strip_prefix('(')
        .and_then(|rest| rest.split(')').next())
        .unwrap_or("");
    let mut slots = 0u8;
    let mut chars = params.chars();
    while let Some(c) = chars.next() {
        match c {
            'J' | 'D' => slots += 2,
            'L' => {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
                slots += 1;
            }
            '[' => {
                // 数组整体只占一个槽位
                let mut next = chars.next();
                while next == Some('[') {
                    next = chars.next();
                }
                if next == Some('L') {
                    for c in chars.by_ref() {
                        if c == ';' {
                            break;
                        }
                    }
                }
                slots += 1;
            }
            _ => slots += 1,
        }
    }
    slots
}

fn member(kind: RefKind, owner: &str, name: &str, descriptor: &str) -> MemberRef {
    MemberRef {
        kind,
        owner: owner.to_string(),
        name: name.to_string(),
        descriptor: descriptor.to_string(),
    }
}

/// 构造一个静态方法句柄
pub fn static_handle(owner: &str, name: &str, descriptor: &str) -> Handle {
    Handle {
        tag: REF_INVOKE_STATIC,
        member: member(RefKind::Method, owner, name, descriptor),
    }
}
