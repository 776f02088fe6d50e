//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use symfix_core::classfile::assembler::ACC_PUBLIC;
use symfix_core::classfile::{code, ClassAssembler, ClassFile, CodeAssembler, Instruction, Invoke};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const MAPPINGS: &str = "tiny\t2\t0\tintermediary\tnamed\n\
c\tpkg/A\tpkg/A\n\
\tm\t()V\tdoX\tdoY\n";

pub const SIDECAR: &str = "accessWidener\tv1\tintermediary\n\
accessible\tmethod\tpkg/A\tdoX\t()V\n";

pub const MANIFEST: &str = "Manifest-Version: 1.0\r\n\r\n";

pub const MOD_JSON: &str = r#"{
  "schemaVersion": 1,
  "id": "example",
  "depends": { "fabricloader": ">=0.14", "minecraft": "1.20.1" }
}"#;

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

/// 写出 zip 归档
pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    fs::write(path, writer.finish().unwrap().into_inner()).unwrap();
}

/// 标准样例：类、访问扩展文件、清单、mod 描述
pub fn write_sample_jar(path: &Path) {
    let class = sample_class();
    write_jar(
        path,
        &[
            ("META-INF/MANIFEST.MF", MANIFEST.as_bytes()),
            ("pkg/A.class", &class),
            ("example.accesswidener", SIDECAR.as_bytes()),
            ("fabric.mod.json", MOD_JSON.as_bytes()),
        ],
    );
}

pub fn write_mappings(dir: &Path) -> PathBuf {
    let path = dir.join("mappings.tiny");
    fs::write(&path, MAPPINGS).unwrap();
    path
}

/// 按存储顺序读出 (名称, 内容)
pub fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(fs::read(path).unwrap())).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}

pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, data)| data.as_slice())
        .unwrap_or_else(|| panic!("missing entry {}", name))
}

/// 方法名与方法体内引用的成员名
pub fn method_and_call_names(bytes: &[u8]) -> (Vec<String>, Vec<String>) {
    let class = ClassFile::parse(bytes).unwrap();
    let mut methods = Vec::new();
    let mut calls = Vec::new();
    for method in &class.methods {
        methods.push(class.pool.utf8(method.name_index).unwrap());
        let Some(body) = method.code() else { continue };
        for insn in code::decode(&body.code).unwrap() {
            if let Instruction::Member { index, .. } = insn {
                calls.push(class.pool.member_ref(index).unwrap().name);
            }
        }
    }
    (methods, calls)
}
