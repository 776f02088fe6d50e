//! 类文件符号改写
//!
//! 流程：
//! 1. 解析为 [`ClassFile`]
//! 2. 类自身的裸名命中字典时改写类名（包路径保持不变）
//! 3. 字段、方法声明名改写
//! 4. 逐条指令改写：成员访问的 owner 裸名与成员名、invokedynamic 的调用名与
//!    bootstrap 句柄名、`ldc` 加载的字符串常量（完全相等才替换）
//! 5. 重新序列化
//!
//! 第 3、4 步先只读地生成改写计划（可在 rayon 线程池上并行），
//! 再按声明顺序串行落地，因此输出字节与日志顺序都是确定的。

use std::fmt;

use rayon::prelude::*;
use symfix_config::RewriteConfig;
use tracing::{info, instrument};

use super::code::{self, Instruction};
use super::constant_pool::{ConstantPool, Handle, MemberRef};
use super::error::ClassError;
use super::reader::{Attribute, BootstrapMethod, ClassFile, MemberInfo};
use crate::mapping::RenameDictionary;

/// 被改写的符号种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameKind {
    Class,
    Field,
    Method,
    /// 成员引用的 owner 类
    Owner,
    /// 成员引用的名字
    Reference,
    /// invokedynamic 的调用名
    DynamicName,
    /// invokedynamic 的 bootstrap 句柄名
    Bootstrap,
    /// ldc 加载的字符串
    StringConstant,
}

impl fmt::Display for RenameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenameKind::Class => "class",
            RenameKind::Field => "field",
            RenameKind::Method => "method",
            RenameKind::Owner => "owner",
            RenameKind::Reference => "reference",
            RenameKind::DynamicName => "indy name",
            RenameKind::Bootstrap => "bootstrap handle",
            RenameKind::StringConstant => "string constant",
        };
        f.write_str(name)
    }
}

/// 一次已应用的改名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub kind: RenameKind,
    pub from: String,
    pub to: String,
}

/// 单个类的改写结果
#[derive(Debug, Clone)]
pub struct ClassRewrite {
    /// 改写后的类内部名
    pub class_name: String,
    pub bytes: Vec<u8>,
    pub renames: Vec<Rename>,
}

impl ClassRewrite {
    pub fn is_changed(&self) -> bool {
        !self.renames.is_empty()
    }
}

/// 声明改名计划：(成员下标, 旧名, 新名)
type DeclPlan = Option<(usize, String, String)>;

/// 单条指令的改写计划
#[derive(Debug, Clone)]
enum InsnPlan {
    Member {
        insn: Instruction,
        member: MemberRef,
        owner: Option<String>,
        name: Option<String>,
    },
    Dynamic {
        insn: Instruction,
        bootstrap: u16,
        name: String,
        descriptor: String,
        new_name: Option<String>,
        handle: Option<(Handle, String)>,
    },
    Ldc {
        insn: Instruction,
        literal: String,
        mapped: String,
    },
}

/// 改写一个类
#[instrument(target = "symfix::class", skip_all)]
pub fn rewrite_class(
    bytes: &[u8],
    dict: &RenameDictionary,
    config: &RewriteConfig,
) -> Result<ClassRewrite, ClassError> {
    let mut class = ClassFile::parse(bytes)?;
    let original_name = class.name()?;
    let mut renames = Vec::new();

    // 类名
    let (prefix, bare) = split_owner(&original_name);
    let mut class_name = original_name.clone();
    if let Some(mapped) = dict.get(bare) {
        class_name = format!("{}{}", prefix, mapped);
        class.this_class = class.pool.intern_class(&class_name)?;
        renames.push(Rename {
            kind: RenameKind::Class,
            from: original_name.clone(),
            to: class_name.clone(),
        });
    }

    // 只读阶段：生成计划
    let field_plans = plan_each(&class.fields, config.parallel, |(i, field)| {
        plan_declaration(&class.pool, dict, i, field)
    })?;
    let method_plans = plan_each(&class.methods, config.parallel, |(i, method)| {
        plan_declaration(&class.pool, dict, i, method)
    })?;
    let bootstraps = class.bootstrap_methods().map(Vec::as_slice);
    let code_plans = plan_each(&class.methods, config.parallel, |(_, method)| {
        plan_code(&class.pool, dict, bootstraps, method)
    })?;

    // 落地阶段
    for (i, old, new) in field_plans.into_iter().flatten() {
        class.fields[i].name_index = class.pool.intern_utf8(&new)?;
        renames.push(Rename {
            kind: RenameKind::Field,
            from: old,
            to: new,
        });
    }
    for (i, old, new) in method_plans.into_iter().flatten() {
        class.methods[i].name_index = class.pool.intern_utf8(&new)?;
        renames.push(Rename {
            kind: RenameKind::Method,
            from: old,
            to: new,
        });
    }

    for (method_idx, plans) in code_plans.into_iter().enumerate() {
        let mut patches = Vec::with_capacity(plans.len());
        for plan in plans {
            if let Some(patched) = apply_plan(&mut class, plan, &mut renames)? {
                patches.push(patched);
            }
        }
        if patches.is_empty() {
            continue;
        }
        if let Some(code) = class.methods[method_idx].code_mut() {
            for insn in patches {
                insn.encode_operand(&mut code.code);
            }
        }
    }

    for rename in &renames {
        info!(
            target: "symfix::class",
            class = %original_name,
            kind = %rename.kind,
            "Remapped {} -> {}",
            rename.from,
            rename.to
        );
    }

    let bytes = if renames.is_empty() {
        bytes.to_vec()
    } else {
        class.to_bytes()
    };

    Ok(ClassRewrite {
        class_name,
        bytes,
        renames,
    })
}

/// 按配置串行或并行地对每个元素生成计划
fn plan_each<T, P, F>(items: &[T], parallel: bool, plan: F) -> Result<Vec<P>, ClassError>
where
    T: Sync,
    P: Send,
    F: Fn((usize, &T)) -> Result<P, ClassError> + Sync + Send,
{
    if parallel {
        items.par_iter().enumerate().map(plan).collect()
    } else {
        items.iter().enumerate().map(plan).collect()
    }
}

fn plan_declaration(
    pool: &ConstantPool,
    dict: &RenameDictionary,
    index: usize,
    member: &MemberInfo,
) -> Result<DeclPlan, ClassError> {
    let name = pool.utf8(member.name_index)?;
    Ok(dict
        .get(&name)
        .map(|mapped| (index, name.clone(), mapped.to_string())))
}

fn plan_code(
    pool: &ConstantPool,
    dict: &RenameDictionary,
    bootstraps: Option<&[BootstrapMethod]>,
    method: &MemberInfo,
) -> Result<Vec<InsnPlan>, ClassError> {
    let Some(code) = method.code() else {
        return Ok(Vec::new());
    };

    let mut plans = Vec::new();
    for insn in code::decode(&code.code)? {
        match insn {
            Instruction::Member { index, .. } => {
                let member = pool.member_ref(index)?;
                let (prefix, bare) = split_owner(&member.owner);
                let owner = dict.get(bare).map(|mapped| format!("{}{}", prefix, mapped));
                let name = dict.get(&member.name).map(str::to_string);
                if owner.is_some() || name.is_some() {
                    plans.push(InsnPlan::Member {
                        insn,
                        member,
                        owner,
                        name,
                    });
                }
            }
            Instruction::InvokeDynamic { index, .. } => {
                let (bootstrap, name_and_type) = pool.invoke_dynamic(index)?;
                let (name, descriptor) = pool.name_and_type(name_and_type)?;
                let table = bootstraps.ok_or(ClassError::MissingBootstrapMethods)?;
                let entry = table
                    .get(bootstrap as usize)
                    .ok_or(ClassError::BootstrapIndexOutOfRange { index: bootstrap })?;
                let handle = pool.method_handle(entry.method_ref)?;

                let new_name = dict.get(&name).map(str::to_string);
                let handle = dict
                    .get(&handle.member.name)
                    .map(|mapped| (handle.clone(), mapped.to_string()));
                if new_name.is_some() || handle.is_some() {
                    plans.push(InsnPlan::Dynamic {
                        insn,
                        bootstrap,
                        name,
                        descriptor,
                        new_name,
                        handle,
                    });
                }
            }
            Instruction::Ldc { index, .. } => {
                if let Some(literal) = pool.string_value(index) {
                    if let Some(mapped) = dict.get(&literal) {
                        plans.push(InsnPlan::Ldc {
                            insn,
                            mapped: mapped.to_string(),
                            literal,
                        });
                    }
                }
            }
            Instruction::Other { .. } => {}
        }
    }
    Ok(plans)
}

/// 落地一条指令计划，返回需要写回方法体的新指令
fn apply_plan(
    class: &mut ClassFile,
    plan: InsnPlan,
    renames: &mut Vec<Rename>,
) -> Result<Option<Instruction>, ClassError> {
    match plan {
        InsnPlan::Member {
            insn,
            mut member,
            owner,
            name,
        } => {
            if let Some(owner) = owner {
                renames.push(Rename {
                    kind: RenameKind::Owner,
                    from: std::mem::replace(&mut member.owner, owner.clone()),
                    to: owner,
                });
            }
            if let Some(name) = name {
                renames.push(Rename {
                    kind: RenameKind::Reference,
                    from: std::mem::replace(&mut member.name, name.clone()),
                    to: name,
                });
            }
            let index = class.pool.intern_member_ref(&member)?;
            Ok(Some(insn.with_index(index)))
        }
        InsnPlan::Dynamic {
            insn,
            mut bootstrap,
            name,
            descriptor,
            new_name,
            handle,
        } => {
            // 调用名先改，bootstrap 句柄基于改名后的调用点重建
            let call_name = match new_name {
                Some(mapped) => {
                    renames.push(Rename {
                        kind: RenameKind::DynamicName,
                        from: name,
                        to: mapped.clone(),
                    });
                    mapped
                }
                None => name,
            };

            if let Some((mut handle, mapped)) = handle {
                let old = std::mem::replace(&mut handle.member.name, mapped.clone());
                let method_ref = class.pool.intern_method_handle(&handle)?;
                bootstrap = replace_bootstrap(&mut class.attributes, bootstrap, method_ref)?;
                renames.push(Rename {
                    kind: RenameKind::Bootstrap,
                    from: old,
                    to: mapped,
                });
            }

            let index = class
                .pool
                .intern_invoke_dynamic(bootstrap, &call_name, &descriptor)?;
            Ok(Some(insn.with_index(index)))
        }
        InsnPlan::Ldc {
            insn,
            literal,
            mapped,
        } => {
            let index = class.pool.intern_string(&mapped)?;
            renames.push(Rename {
                kind: RenameKind::StringConstant,
                from: literal.clone(),
                to: mapped.clone(),
            });
            match insn {
                Instruction::Ldc {
                    index: old,
                    wide: false,
                    ..
                } if index > u8::MAX as u16 => {
                    // 单字节操作数放不下新索引
                    class.pool.repoint_string(old, &mapped)?;
                    detach_string(class, old, &literal)?;
                    Ok(None)
                }
                _ => Ok(Some(insn.with_index(index))),
            }
        }
    }
}

/// 常量被改指向后，字段 `ConstantValue` 与 bootstrap 静态参数仍需原文本：
/// 把它们迁到一个新的 String 常量上
fn detach_string(class: &mut ClassFile, index: u16, literal: &str) -> Result<(), ClassError> {
    let pool = &class.pool;
    let is_constant_value =
        |name_index: u16| pool.try_utf8(name_index).as_deref() == Some("ConstantValue");

    let mut field_refs = Vec::new();
    for (f, field) in class.fields.iter().enumerate() {
        for (a, attr) in field.attributes.iter().enumerate() {
            if let Attribute::Raw { name_index, info } = attr {
                if is_constant_value(*name_index) && info[..] == index.to_be_bytes()[..] {
                    field_refs.push((f, a));
                }
            }
        }
    }
    let shared_by_bootstrap = class
        .bootstrap_methods()
        .is_some_and(|table| table.iter().any(|m| m.arguments.contains(&index)));

    if field_refs.is_empty() && !shared_by_bootstrap {
        return Ok(());
    }

    let copy = class.pool.intern_string(literal)?;
    for (f, a) in field_refs {
        if let Attribute::Raw { info, .. } = &mut class.fields[f].attributes[a] {
            *info = copy.to_be_bytes().to_vec();
        }
    }
    if let Some(table) = class.bootstrap_methods_mut() {
        for argument in table.iter_mut().flat_map(|m| m.arguments.iter_mut()) {
            if *argument == index {
                *argument = copy;
            }
        }
    }
    Ok(())
}

/// 复制一项 bootstrap 方法并替换句柄，返回新项下标（相同项复用）
fn replace_bootstrap(
    attributes: &mut [Attribute],
    original: u16,
    method_ref: u16,
) -> Result<u16, ClassError> {
    let table = attributes
        .iter_mut()
        .find_map(|attr| match attr {
            Attribute::BootstrapMethods { methods, .. } => Some(methods),
            _ => None,
        })
        .ok_or(ClassError::MissingBootstrapMethods)?;

    let arguments = table
        .get(original as usize)
        .ok_or(ClassError::BootstrapIndexOutOfRange { index: original })?
        .arguments
        .clone();
    let entry = BootstrapMethod {
        method_ref,
        arguments,
    };

    if let Some(existing) = table.iter().position(|m| *m == entry) {
        return Ok(existing as u16);
    }
    if table.len() >= u16::MAX as usize {
        return Err(ClassError::BootstrapIndexOutOfRange {
            index: u16::MAX,
        });
    }
    table.push(entry);
    Ok((table.len() - 1) as u16)
}

/// 拆分内部名：(`a/b/`, `Old`)，没有包路径时前缀为空
pub fn split_owner(owner: &str) -> (&str, &str) {
    match owner.rfind('/') {
        Some(pos) => owner.split_at(pos + 1),
        None => ("", owner),
    }
}
