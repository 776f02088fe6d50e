//! 测试辅助工具
//!
//! 构造类文件 / 归档样例，以及把改写结果还原成便于断言的视图

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use symfix_core::classfile::assembler::ACC_PUBLIC;
use symfix_core::classfile::{code, ClassAssembler, ClassFile, CodeAssembler, Instruction, Invoke, MemberRef};
use symfix_core::mapping::RenameDictionary;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// 由键值对构造字典
pub fn dict(pairs: &[(&str, &str)]) -> RenameDictionary {
    pairs.iter().copied().collect()
}

/// `pkg/A`：方法 `doX` 自己调用 `doX`
pub fn sample_class() -> Vec<u8> {
    let mut body = CodeAssembler::new();
    body.aload_0()
        .invoke(Invoke::Virtual, "pkg/A", "doX", "()V")
        .return_void();

    let mut class = ClassAssembler::new("pkg/A");
    class.method(ACC_PUBLIC, "doX", "()V", body);
    class.finish().unwrap()
}

/// 类文件的可断言视图
#[derive(Debug, Default)]
pub struct ClassView {
    pub name: String,
    pub fields: Vec<String>,
    pub methods: Vec<String>,
    pub refs: Vec<MemberRef>,
    pub strings: Vec<String>,
    /// (调用名, bootstrap 句柄名)
    pub indy: Vec<(String, String)>,
    /// 每个方法体的 (字节长度, 指令偏移)
    pub layout: Vec<(usize, Vec<usize>)>,
}

pub fn inspect(bytes: &[u8]) -> ClassView {
    let class = ClassFile::parse(bytes).unwrap();
    let pool = &class.pool;
    let mut view = ClassView {
        name: class.name().unwrap(),
        ..Default::default()
    };

    for field in &class.fields {
        view.fields.push(pool.utf8(field.name_index).unwrap());
    }
    for method in &class.methods {
        view.methods.push(pool.utf8(method.name_index).unwrap());
        let Some(body) = method.code() else { continue };
        let insns = code::decode(&body.code).unwrap();
        view.layout
            .push((body.code.len(), insns.iter().map(Instruction::offset).collect()));

        for insn in insns {
            match insn {
                Instruction::Member { index, .. } => view.refs.push(pool.member_ref(index).unwrap()),
                Instruction::Ldc { index, .. } => {
                    if let Some(value) = pool.string_value(index) {
                        view.strings.push(value);
                    }
                }
                Instruction::InvokeDynamic { index, .. } => {
                    let (bootstrap, nat) = pool.invoke_dynamic(index).unwrap();
                    let (name, _) = pool.name_and_type(nat).unwrap();
                    let entry = &class.bootstrap_methods().unwrap()[bootstrap as usize];
                    let handle = pool.method_handle(entry.method_ref).unwrap();
                    view.indy.push((name, handle.member.name));
                }
                Instruction::Other { .. } => {}
            }
        }
    }
    view
}

/// 构造内存中的 zip，名字以 `/` 结尾的条目为目录
pub fn build_zip(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(method);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// 条目快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub name: String,
    pub method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u64,
    pub data: Vec<u8>,
}

/// 按存储顺序读取所有条目
pub fn read_zip(bytes: &[u8]) -> Vec<EntrySnapshot> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        entries.push(EntrySnapshot {
            name: entry.name().to_string(),
            method: entry.compression(),
            crc32: entry.crc32(),
            compressed_size: entry.compressed_size(),
            data,
        });
    }
    entries
}

pub fn entry<'a>(entries: &'a [EntrySnapshot], name: &str) -> &'a EntrySnapshot {
    entries
        .iter()
        .find(|e| e.name == name)
        .unwrap_or_else(|| panic!("missing entry {}", name))
}
