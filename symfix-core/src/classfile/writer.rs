//! 类文件写入器
//!
//! 所有属性长度在写出时根据实际内容重新计算。

use super::reader::{Attribute, BootstrapMethod, ClassFile, CodeAttribute, MemberInfo, MAGIC};

impl ClassFile {
    /// 序列化为 `.class` 字节
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1024);

        put_u32(&mut out, MAGIC);
        put_u16(&mut out, self.minor_version);
        put_u16(&mut out, self.major_version);
        self.pool.write(&mut out);

        put_u16(&mut out, self.access_flags);
        put_u16(&mut out, self.this_class);
        put_u16(&mut out, self.super_class);
        put_u16(&mut out, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            put_u16(&mut out, *interface);
        }

        write_members(&mut out, &self.fields);
        write_members(&mut out, &self.methods);
        write_attributes(&mut out, &self.attributes);
        out
    }
}

fn write_members(out: &mut Vec<u8>, members: &[MemberInfo]) {
    put_u16(out, members.len() as u16);
    for member in members {
        put_u16(out, member.access_flags);
        put_u16(out, member.name_index);
        put_u16(out, member.descriptor_index);
        write_attributes(out, &member.attributes);
    }
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[Attribute]) {
    put_u16(out, attributes.len() as u16);
    for attribute in attributes {
        match attribute {
            Attribute::Code(code) => {
                let body = code_body(code);
                put_u16(out, code.name_index);
                put_u32(out, body.len() as u32);
                out.extend_from_slice(&body);
            }
            Attribute::BootstrapMethods {
                name_index,
                methods,
            } => {
                let body = bootstrap_body(methods);
                put_u16(out, *name_index);
                put_u32(out, body.len() as u32);
                out.extend_from_slice(&body);
            }
            Attribute::Raw { name_index, info } => {
                put_u16(out, *name_index);
                put_u32(out, info.len() as u32);
                out.extend_from_slice(info);
            }
        }
    }
}

fn code_body(code: &CodeAttribute) -> Vec<u8> {
    let mut body = Vec::with_capacity(code.code.len() + 32);
    put_u16(&mut body, code.max_stack);
    put_u16(&mut body, code.max_locals);
    put_u32(&mut body, code.code.len() as u32);
    body.extend_from_slice(&code.code);

    put_u16(&mut body, code.exception_table.len() as u16);
    for handler in &code.exception_table {
        put_u16(&mut body, handler.start_pc);
        put_u16(&mut body, handler.end_pc);
        put_u16(&mut body, handler.handler_pc);
        put_u16(&mut body, handler.catch_type);
    }

    write_attributes(&mut body, &code.attributes);
    body
}

fn bootstrap_body(methods: &[BootstrapMethod]) -> Vec<u8> {
    let mut body = Vec::new();
    put_u16(&mut body, methods.len() as u16);
    for method in methods {
        put_u16(&mut body, method.method_ref);
        put_u16(&mut body, method.arguments.len() as u16);
        for argument in &method.arguments {
            put_u16(&mut body, *argument);
        }
    }
    body
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
