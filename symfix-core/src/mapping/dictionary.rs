//! 重命名字典
//!
//! 裸名（不带包路径、不带描述符）到新裸名的映射。
//! 加载完成后不可变，所有类的改写共享同一份只读字典。

use std::collections::HashMap;

/// 重命名字典
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameDictionary {
    entries: HashMap<String, String>,
}

impl RenameDictionary {
    /// 创建空字典
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入映射，返回被覆盖的旧值
    ///
    /// 自映射（`from == to`）被丢弃，字典中永远不存在映射到自身的键。
    pub(crate) fn insert(&mut self, from: &str, to: &str) -> Option<String> {
        if from == to {
            return None;
        }
        self.entries.insert(from.to_string(), to.to_string())
    }

    /// 查询裸名对应的新名字
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// 是否包含键
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 遍历所有映射（无序）
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for RenameDictionary
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    /// 后出现的键覆盖先出现的，自映射被丢弃
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = RenameDictionary::new();
        for (from, to) in iter {
            dict.insert(from.as_ref(), to.as_ref());
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_mapping_dropped() {
        let dict: RenameDictionary = [("a", "a"), ("b", "c")].into_iter().collect();
        assert!(!dict.contains_key("a"));
        assert_eq!(dict.get("b"), Some("c"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let dict: RenameDictionary = [("x", "first"), ("x", "second")].into_iter().collect();
        assert_eq!(dict.get("x"), Some("second"));
    }

    #[test]
    fn test_insert_returns_previous() {
        let mut dict = RenameDictionary::new();
        assert_eq!(dict.insert("k", "v1"), None);
        assert_eq!(dict.insert("k", "v2"), Some("v1".to_string()));
        assert!(!dict.is_empty());
    }
}
