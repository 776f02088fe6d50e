//! tiny v2 映射树
//!
//! 按层级解析 tiny v2 文件（类行 + 缩进的成员行），得到两个命名空间之间的
//! 类、方法、字段映射，作为访问扩展文件第一阶段改写的委托。
//!
//! ```text
//! tiny	2	0	intermediary	named
//! c	net/minecraft/class_1	net/minecraft/Block
//! 	m	(I)V	method_10	setLevel
//! 	f	I	field_20	level
//! 		p	1		level
//! ```

use std::collections::HashMap;
use std::io::BufRead;

use tracing::{debug, instrument};

use super::delegate::NamespaceRemapper;
use super::loader::MappingError;

/// 方法键：(owner, name, descriptor)，均为源命名空间
type MethodKey = (String, String, String);

/// 两个命名空间之间的层级映射
#[derive(Debug, Clone, Default)]
pub struct TinyTree {
    from: String,
    to: String,
    classes: HashMap<String, String>,
    methods: HashMap<MethodKey, String>,
    /// 字段按 (owner, name) 查找，忽略描述符
    fields: HashMap<(String, String), String>,
}

/// 解析中的成员行（描述符仍处于首列命名空间）
struct PendingMember {
    owner: String,
    name: String,
    descriptor: String,
    target: String,
}

impl TinyTree {
    /// 解析 tiny v2 文本，提取 `from -> to` 方向的映射
    #[instrument(target = "symfix::mappings", skip(reader))]
    pub fn parse<R: BufRead>(reader: R, from: &str, to: &str) -> Result<Self, MappingError> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line.map_err(|source| MappingError::Io { line: 1, source })?,
            None => return Err(MappingError::InvalidHeader { line: 1 }),
        };
        let columns: Vec<&str> = header.split('\t').collect();
        if columns.len() < 5 || columns[0] != "tiny" || columns[1] != "2" {
            return Err(MappingError::InvalidHeader { line: 1 });
        }
        let namespaces = &columns[3..];
        let from_idx = namespace_index(namespaces, from)?;
        let to_idx = namespace_index(namespaces, to)?;

        let mut tree = TinyTree {
            from: from.to_string(),
            to: to.to_string(),
            ..Default::default()
        };
        // 首列命名空间 -> 源命名空间，用于转换成员描述符
        let mut primary_to_from: HashMap<String, String> = HashMap::new();
        let mut methods: Vec<PendingMember> = Vec::new();
        let mut fields: Vec<PendingMember> = Vec::new();
        let mut current_class: Option<String> = None;

        for (idx, line) in lines.enumerate() {
            let line_no = idx + 2;
            let line = line.map_err(|source| MappingError::Io {
                line: line_no,
                source,
            })?;

            let depth = line.chars().take_while(|&c| c == '\t').count();
            let parts: Vec<&str> = line[depth..].split('\t').collect();

            match (depth, parts.first().copied()) {
                (0, Some("c")) => {
                    let Some(primary) = column(&parts, 1, 0) else {
                        current_class = None;
                        continue;
                    };
                    let source_name = column(&parts, 1, from_idx).unwrap_or(primary);
                    if let Some(target) = column(&parts, 1, to_idx) {
                        if target != source_name {
                            tree.classes
                                .insert(source_name.to_string(), target.to_string());
                        }
                    }
                    primary_to_from.insert(primary.to_string(), source_name.to_string());
                    current_class = Some(source_name.to_string());
                }
                (0, _) => current_class = None,
                (1, Some(kind @ ("m" | "f"))) => {
                    let Some(owner) = current_class.clone() else {
                        continue;
                    };
                    let (Some(descriptor), Some(primary)) = (parts.get(1), column(&parts, 2, 0))
                    else {
                        continue;
                    };
                    let name = column(&parts, 2, from_idx).unwrap_or(primary);
                    let Some(target) = column(&parts, 2, to_idx) else {
                        continue;
                    };
                    if target == name {
                        continue;
                    }
                    let member = PendingMember {
                        owner,
                        name: name.to_string(),
                        descriptor: descriptor.to_string(),
                        target: target.to_string(),
                    };
                    if kind == "m" {
                        methods.push(member);
                    } else {
                        fields.push(member);
                    }
                }
                _ => {}
            }
        }

        let translate = PrimaryClasses(&primary_to_from);
        for member in methods {
            let descriptor = if from_idx == 0 {
                member.descriptor
            } else {
                translate.map_descriptor(&member.descriptor)
            };
            tree.methods
                .insert((member.owner, member.name, descriptor), member.target);
        }
        for member in fields {
            tree.fields.insert((member.owner, member.name), member.target);
        }

        debug!(
            target: "symfix::mappings",
            classes = tree.classes.len(),
            methods = tree.methods.len(),
            fields = tree.fields.len(),
            "parsed tiny tree"
        );
        Ok(tree)
    }

    /// 源命名空间
    pub fn from_namespace(&self) -> &str {
        &self.from
    }

    /// 目标命名空间
    pub fn to_namespace(&self) -> &str {
        &self.to
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn member_count(&self) -> usize {
        self.methods.len() + self.fields.len()
    }
}

impl NamespaceRemapper for TinyTree {
    fn map_class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).map(String::as_str)
    }

    fn map_method_name(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str> {
        self.methods
            .get(&(owner.to_string(), name.to_string(), descriptor.to_string()))
            .map(String::as_str)
    }

    fn map_field_name(&self, owner: &str, name: &str, _descriptor: &str) -> Option<&str> {
        self.fields
            .get(&(owner.to_string(), name.to_string()))
            .map(String::as_str)
    }
}

/// 首列命名空间到源命名空间的类名转换
struct PrimaryClasses<'a>(&'a HashMap<String, String>);

impl NamespaceRemapper for PrimaryClasses<'_> {
    fn map_class(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn map_method_name(&self, _owner: &str, _name: &str, _descriptor: &str) -> Option<&str> {
        None
    }

    fn map_field_name(&self, _owner: &str, _name: &str, _descriptor: &str) -> Option<&str> {
        None
    }
}

fn namespace_index(namespaces: &[&str], wanted: &str) -> Result<usize, MappingError> {
    namespaces
        .iter()
        .position(|ns| *ns == wanted)
        .ok_or_else(|| MappingError::UnknownNamespace {
            namespace: wanted.to_string(),
        })
}

/// 取第 `offset + ns` 列，空列视为缺失
fn column<'a>(parts: &[&'a str], offset: usize, ns: usize) -> Option<&'a str> {
    parts
        .get(offset + ns)
        .copied()
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "tiny\t2\t0\tintermediary\tnamed\n\
c\tnet/minecraft/class_1\tnet/minecraft/Block\n\
\tm\t(Lnet/minecraft/class_1;)V\tmethod_10\tcopyFrom\n\
\tf\tI\tfield_20\tlevel\n\
\t\tp\t1\t\tlevel\n\
\tc\tsome comment\n\
c\tnet/minecraft/class_2\n\
\tm\t()V\tmethod_11\tmethod_11\n";

    fn tree() -> TinyTree {
        TinyTree::parse(Cursor::new(SAMPLE), "intermediary", "named").unwrap()
    }

    #[test]
    fn test_classes() {
        let tree = tree();
        assert_eq!(tree.map_class("net/minecraft/class_1"), Some("net/minecraft/Block"));
        assert_eq!(tree.map_class("net/minecraft/class_2"), None);
        assert_eq!(tree.class_count(), 1);
    }

    #[test]
    fn test_members() {
        let tree = tree();
        assert_eq!(
            tree.map_method_name(
                "net/minecraft/class_1",
                "method_10",
                "(Lnet/minecraft/class_1;)V"
            ),
            Some("copyFrom")
        );
        assert_eq!(
            tree.map_field_name("net/minecraft/class_1", "field_20", "J"),
            Some("level")
        );
        assert_eq!(tree.map_method_name("net/minecraft/class_2", "method_11", "()V"), None);
        assert_eq!(tree.member_count(), 2);
    }

    #[test]
    fn test_reverse_direction_translates_descriptors() {
        let tree = TinyTree::parse(Cursor::new(SAMPLE), "named", "intermediary").unwrap();
        assert_eq!(tree.map_class("net/minecraft/Block"), Some("net/minecraft/class_1"));
        assert_eq!(
            tree.map_method_name("net/minecraft/Block", "copyFrom", "(Lnet/minecraft/Block;)V"),
            Some("method_10")
        );
    }

    #[test]
    fn test_unknown_namespace() {
        let result = TinyTree::parse(Cursor::new(SAMPLE), "official", "named");
        assert!(matches!(result, Err(MappingError::UnknownNamespace { .. })));
    }

    #[test]
    fn test_invalid_header() {
        let result = TinyTree::parse(Cursor::new("v1\tintermediary\tnamed\n"), "intermediary", "named");
        assert!(matches!(result, Err(MappingError::InvalidHeader { line: 1 })));
    }
}
