//! 访问扩展文件改写
//!
//! 两个阶段：
//! 1. 委托改写（命名空间感知）：解析、逐项改写、重新序列化
//! 2. 字典改写：文件头之后的每一行按制表符切分，命中字典的片段在整行内做文本替换
//!
//! 最终输出所有制表符替换为单个空格，文件头之后紧跟一个空行。

use symfix_config::Namespaces;
use tracing::{info, instrument};

use crate::mapping::{NamespaceRemapper, RenameDictionary};

use super::error::SidecarError;
use super::{reader, remapper};

/// 改写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarRewrite {
    pub bytes: Vec<u8>,
    /// 委托阶段改变的条目数
    pub remapped_entries: usize,
    /// 字典阶段的替换 (旧片段, 新片段)
    pub substitutions: Vec<(String, String)>,
}

/// 改写一个访问扩展文件
#[instrument(target = "symfix::sidecar", skip_all)]
pub fn rewrite_sidecar(
    bytes: &[u8],
    delegate: &dyn NamespaceRemapper,
    namespaces: &Namespaces,
    dict: &RenameDictionary,
) -> Result<SidecarRewrite, SidecarError> {
    let text = std::str::from_utf8(bytes).map_err(|_| SidecarError::InvalidUtf8)?;

    let widener = reader::parse(text, &namespaces.from)?;
    let remapped = remapper::remap(&widener, delegate, &namespaces.to);
    let mut remapped_entries = 0;
    for (before, after) in widener.entries.iter().zip(&remapped.entries) {
        if before != after {
            remapped_entries += 1;
            info!(target: "symfix::sidecar", "Remapped {} -> {}", before, after);
        }
    }

    let (text, substitutions) = apply_dictionary(&remapped.to_text(), dict);
    for (from, to) in &substitutions {
        info!(target: "symfix::sidecar", "Replaced {} -> {}", from, to);
    }

    Ok(SidecarRewrite {
        bytes: text.into_bytes(),
        remapped_entries,
        substitutions,
    })
}

/// 字典阶段与空白归一化
///
/// 替换是整行内的子串替换，因此片段的子串出现处也会被改写。
pub fn apply_dictionary(text: &str, dict: &RenameDictionary) -> (String, Vec<(String, String)>) {
    let mut lines = text.lines();
    let mut out = String::with_capacity(text.len() + 2);
    let mut substitutions = Vec::new();

    if let Some(header) = lines.next() {
        out.push_str(&header.replace('\t', " "));
    }
    out.push_str("\n\n");

    for line in lines {
        let mut line = line.to_string();
        let parts: Vec<String> = line.split('\t').map(str::to_string).collect();
        for part in parts {
            if let Some(mapped) = dict.get(&part) {
                line = line.replace(part.as_str(), mapped);
                substitutions.push((part, mapped.to_string()));
            }
        }
        out.push_str(&line.replace('\t', " "));
        out.push('\n');
    }

    (out, substitutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::IdentityRemapper;

    fn dict(pairs: &[(&str, &str)]) -> RenameDictionary {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_dictionary_pass_and_normalization() {
        let (text, subs) = apply_dictionary(
            "accessWidener\tv1\tnamed\naccessible\tmethod\tpkg/A\tdoX\t()V\n",
            &dict(&[("doX", "doY")]),
        );
        assert_eq!(
            text,
            "accessWidener v1 named\n\naccessible method pkg/A doY ()V\n"
        );
        assert_eq!(subs, vec![("doX".to_string(), "doY".to_string())]);
    }

    #[test]
    fn test_substrings_are_replaced_within_line() {
        // 片段 "B" 命中后，整行中所有 "B" 都被替换
        let (text, _) = apply_dictionary(
            "accessWidener\tv1\tnamed\naccessible\tfield\ta/B\tB\tI\n",
            &dict(&[("B", "C")]),
        );
        assert_eq!(text, "accessWidener v1 named\n\naccessible field a/C C I\n");
    }

    #[test]
    fn test_rewrite_sidecar_end_to_end() {
        let input = b"accessWidener\tv1\tintermediary\naccessible\tmethod\tpkg/A\tdoX\t()V\n";
        let result = rewrite_sidecar(
            input,
            &IdentityRemapper,
            &Namespaces::default(),
            &dict(&[("doX", "doY")]),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(result.bytes).unwrap(),
            "accessWidener v1 named\n\naccessible method pkg/A doY ()V\n"
        );
        assert_eq!(result.remapped_entries, 0);
        assert_eq!(result.substitutions.len(), 1);
    }

    #[test]
    fn test_malformed_sidecar_is_an_error() {
        let result = rewrite_sidecar(
            b"accessWidener\tv1\tintermediary\nmutable\tclass\tpkg/A\n",
            &IdentityRemapper,
            &Namespaces::default(),
            &RenameDictionary::new(),
        );
        assert!(matches!(result, Err(SidecarError::IllegalAccess { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        let result = rewrite_sidecar(
            &[0xff, 0xfe],
            &IdentityRemapper,
            &Namespaces::default(),
            &RenameDictionary::new(),
        );
        assert_eq!(result, Err(SidecarError::InvalidUtf8));
    }
}
