//! 访问扩展文件读取器
//!
//! ```text
//! accessWidener	v2	intermediary
//! # 注释
//! accessible	class	net/minecraft/class_1
//! transitive-accessible	method	net/minecraft/class_1	method_10	()V
//! mutable	field	net/minecraft/class_1	field_20	I
//! ```

use super::error::SidecarError;
use super::model::{AccessKind, AccessWidener, Entry, Target};

const HEADER: &str = "accessWidener";
const TRANSITIVE: &str = "transitive-";

/// 解析访问扩展文件，文件头命名空间必须等于 `namespace`
pub fn parse(text: &str, namespace: &str) -> Result<AccessWidener, SidecarError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or(SidecarError::MissingHeader)?;
    let mut widener = parse_header(header, namespace)?;

    for (idx, raw) in lines.enumerate() {
        let line_no = idx + 2;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();
        widener
            .entries
            .push(parse_entry(&tokens, widener.version, line_no)?);
    }

    Ok(widener)
}

fn parse_header(line: &str, namespace: &str) -> Result<AccessWidener, SidecarError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [magic, version, found] = tokens.as_slice() else {
        return Err(SidecarError::BadHeader {
            header: line.to_string(),
        });
    };
    if *magic != HEADER {
        return Err(SidecarError::BadHeader {
            header: line.to_string(),
        });
    }

    let version = match *version {
        "v1" => 1,
        "v2" => 2,
        other => {
            return Err(SidecarError::UnsupportedVersion {
                version: other.to_string(),
            })
        }
    };
    if *found != namespace {
        return Err(SidecarError::NamespaceMismatch {
            expected: namespace.to_string(),
            found: found.to_string(),
        });
    }

    Ok(AccessWidener::new(version, found))
}

fn parse_entry(tokens: &[&str], version: u8, line: usize) -> Result<Entry, SidecarError> {
    let (access_token, transitive) = match tokens[0].strip_prefix(TRANSITIVE) {
        Some(rest) => (rest, true),
        None => (tokens[0], false),
    };
    if transitive && version < 2 {
        return Err(SidecarError::TransitiveRequiresV2 { line });
    }
    let access = AccessKind::parse(access_token).ok_or_else(|| SidecarError::UnknownAccess {
        line,
        token: tokens[0].to_string(),
    })?;

    let kind: &'static str = match tokens.get(1).copied() {
        Some("class") => "class",
        Some("method") => "method",
        Some("field") => "field",
        Some(other) => {
            return Err(SidecarError::UnknownKind {
                line,
                token: other.to_string(),
            })
        }
        None => {
            return Err(SidecarError::TokenCount {
                line,
                kind: "entry",
                expected: 3,
                found: tokens.len(),
            })
        }
    };

    let expected = if kind == "class" { 3 } else { 5 };
    if tokens.len() != expected {
        return Err(SidecarError::TokenCount {
            line,
            kind,
            expected,
            found: tokens.len(),
        });
    }
    if !Target::permits(kind, access) {
        return Err(SidecarError::IllegalAccess {
            line,
            kind,
            access: access.as_str(),
        });
    }

    let class_name = tokens[2];
    if class_name.contains('.') {
        return Err(SidecarError::DottedClassName {
            line,
            name: class_name.to_string(),
        });
    }

    let target = match kind {
        "class" => Target::Class {
            name: class_name.to_string(),
        },
        "method" => Target::Method {
            owner: class_name.to_string(),
            name: tokens[3].to_string(),
            descriptor: tokens[4].to_string(),
        },
        _ => Target::Field {
            owner: class_name.to_string(),
            name: tokens[3].to_string(),
            descriptor: tokens[4].to_string(),
        },
    };

    Ok(Entry {
        access,
        transitive,
        target,
    })
}
