//! 委托重命名能力
//!
//! 主重映射器按命名空间（intermediary -> named）重命名类、方法、字段。
//! 访问扩展文件（access widener）的第一阶段改写通过该 trait 调用它。

/// 命名空间感知的重命名委托
///
/// 所有方法都是纯函数：返回 `None` 表示该符号在目标命名空间中保持原名。
pub trait NamespaceRemapper: Send + Sync {
    /// 映射类的内部名（`a/b/C`）
    fn map_class(&self, name: &str) -> Option<&str>;

    /// 映射方法名，`owner` 与 `descriptor` 均为源命名空间
    fn map_method_name(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str>;

    /// 映射字段名，`owner` 与 `descriptor` 均为源命名空间
    fn map_field_name(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str>;

    /// 映射类名，未映射时返回原名
    fn map_type(&self, name: &str) -> String {
        self.map_class(name).unwrap_or(name).to_string()
    }

    /// 重写描述符中出现的所有类名
    fn map_descriptor(&self, descriptor: &str) -> String {
        let mut out = String::with_capacity(descriptor.len());
        let mut rest = descriptor;

        while let Some(start) = rest.find('L') {
            out.push_str(&rest[..=start]);
            let tail = &rest[start + 1..];
            match tail.find(';') {
                Some(end) => {
                    out.push_str(&self.map_type(&tail[..end]));
                    out.push(';');
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// 不做任何重命名的委托
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRemapper;

impl NamespaceRemapper for IdentityRemapper {
    fn map_class(&self, _name: &str) -> Option<&str> {
        None
    }

    fn map_method_name(&self, _owner: &str, _name: &str, _descriptor: &str) -> Option<&str> {
        None
    }

    fn map_field_name(&self, _owner: &str, _name: &str, _descriptor: &str) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneClass;

    impl NamespaceRemapper for OneClass {
        fn map_class(&self, name: &str) -> Option<&str> {
            (name == "net/minecraft/class_1").then_some("net/minecraft/Block")
        }

        fn map_method_name(&self, _owner: &str, _name: &str, _descriptor: &str) -> Option<&str> {
            None
        }

        fn map_field_name(&self, _owner: &str, _name: &str, _descriptor: &str) -> Option<&str> {
            None
        }
    }

    #[test]
    fn test_map_descriptor() {
        let remapper = OneClass;
        assert_eq!(
            remapper.map_descriptor("(ILnet/minecraft/class_1;[Ljava/lang/String;)Lnet/minecraft/class_1;"),
            "(ILnet/minecraft/Block;[Ljava/lang/String;)Lnet/minecraft/Block;"
        );
        assert_eq!(remapper.map_descriptor("()V"), "()V");
    }

    #[test]
    fn test_identity() {
        let remapper = IdentityRemapper;
        assert_eq!(remapper.map_type("a/B"), "a/B");
        assert_eq!(remapper.map_descriptor("(La/B;)V"), "(La/B;)V");
        assert!(remapper.map_method_name("a/B", "m", "()V").is_none());
    }
}
