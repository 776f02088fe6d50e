//! 访问扩展文件写入器
//!
//! 输出以制表符分隔，每行以 `\n` 结尾。含 transitive 条目时版本至少为 v2。

use super::model::AccessWidener;

impl AccessWidener {
    pub fn to_text(&self) -> String {
        let version = if self.entries.iter().any(|entry| entry.transitive) {
            self.version.max(2)
        } else {
            self.version
        };

        let mut out = format!("accessWidener\tv{}\t{}\n", version, self.namespace);
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::sidecar::model::{AccessKind, AccessWidener, Entry, Target};

    #[test]
    fn test_write_entries() {
        let mut widener = AccessWidener::new(1, "named");
        widener.entries.push(Entry {
            access: AccessKind::Accessible,
            transitive: false,
            target: Target::Class {
                name: "a/B".to_string(),
            },
        });
        widener.entries.push(Entry {
            access: AccessKind::Mutable,
            transitive: false,
            target: Target::Field {
                owner: "a/B".to_string(),
                name: "count".to_string(),
                descriptor: "I".to_string(),
            },
        });
        assert_eq!(
            widener.to_text(),
            "accessWidener\tv1\tnamed\naccessible\tclass\ta/B\nmutable\tfield\ta/B\tcount\tI\n"
        );
    }

    #[test]
    fn test_transitive_forces_v2() {
        let mut widener = AccessWidener::new(1, "named");
        widener.entries.push(Entry {
            access: AccessKind::Accessible,
            transitive: true,
            target: Target::Method {
                owner: "a/B".to_string(),
                name: "run".to_string(),
                descriptor: "()V".to_string(),
            },
        });
        assert_eq!(
            widener.to_text(),
            "accessWidener\tv2\tnamed\ntransitive-accessible\tmethod\ta/B\trun\t()V\n"
        );
    }
}
