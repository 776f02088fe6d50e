//! 第一阶段：通过委托把访问扩展文件从源命名空间改写到目标命名空间

use crate::mapping::NamespaceRemapper;

use super::model::{AccessWidener, Entry, Target};

/// 改写所有目标并把文件头命名空间切换为 `to`
///
/// 查找成员名时 owner 与描述符都使用改写前的源命名空间名字。
pub fn remap(widener: &AccessWidener, delegate: &dyn NamespaceRemapper, to: &str) -> AccessWidener {
    let entries = widener
        .entries
        .iter()
        .map(|entry| Entry {
            access: entry.access,
            transitive: entry.transitive,
            target: remap_target(&entry.target, delegate),
        })
        .collect();

    AccessWidener {
        version: widener.version,
        namespace: to.to_string(),
        entries,
    }
}

fn remap_target(target: &Target, delegate: &dyn NamespaceRemapper) -> Target {
    match target {
        Target::Class { name } => Target::Class {
            name: delegate.map_type(name),
        },
        Target::Method {
            owner,
            name,
            descriptor,
        } => Target::Method {
            owner: delegate.map_type(owner),
            name: delegate
                .map_method_name(owner, name, descriptor)
                .unwrap_or(name)
                .to_string(),
            descriptor: delegate.map_descriptor(descriptor),
        },
        Target::Field {
            owner,
            name,
            descriptor,
        } => Target::Field {
            owner: delegate.map_type(owner),
            name: delegate
                .map_field_name(owner, name, descriptor)
                .unwrap_or(name)
                .to_string(),
            descriptor: delegate.map_descriptor(descriptor),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{IdentityRemapper, TinyTree};
    use crate::sidecar::model::AccessKind;
    use std::io::Cursor;

    const TINY: &str = "tiny\t2\t0\tintermediary\tnamed\n\
c\tnet/minecraft/class_1\tnet/minecraft/Block\n\
\tm\t(Lnet/minecraft/class_1;)V\tmethod_10\tcopyFrom\n\
\tf\tI\tfield_20\tlevel\n";

    fn widener() -> AccessWidener {
        let mut widener = AccessWidener::new(1, "intermediary");
        widener.entries.push(Entry {
            access: AccessKind::Accessible,
            transitive: false,
            target: Target::Method {
                owner: "net/minecraft/class_1".to_string(),
                name: "method_10".to_string(),
                descriptor: "(Lnet/minecraft/class_1;)V".to_string(),
            },
        });
        widener.entries.push(Entry {
            access: AccessKind::Mutable,
            transitive: false,
            target: Target::Field {
                owner: "net/minecraft/class_1".to_string(),
                name: "field_20".to_string(),
                descriptor: "I".to_string(),
            },
        });
        widener
    }

    #[test]
    fn test_remap_through_tree() {
        let tree = TinyTree::parse(Cursor::new(TINY), "intermediary", "named").unwrap();
        let remapped = remap(&widener(), &tree, "named");

        assert_eq!(remapped.namespace, "named");
        assert_eq!(
            remapped.entries[0].target,
            Target::Method {
                owner: "net/minecraft/Block".to_string(),
                name: "copyFrom".to_string(),
                descriptor: "(Lnet/minecraft/Block;)V".to_string(),
            }
        );
        assert_eq!(
            remapped.entries[1].target,
            Target::Field {
                owner: "net/minecraft/Block".to_string(),
                name: "level".to_string(),
                descriptor: "I".to_string(),
            }
        );
    }

    #[test]
    fn test_identity_only_switches_namespace() {
        let original = widener();
        let remapped = remap(&original, &IdentityRemapper, "named");
        assert_eq!(remapped.entries, original.entries);
        assert_eq!(remapped.namespace, "named");
    }
}
