//! # 变更签名
//!
//! 宿主据此判断是否需要重新执行加载。只依赖当前调用中非空字段的键值对，
//! 不是内容指纹：同一路径下文件内容变化不会改变签名。

use std::fmt;

use super::SourceInputs;

/// 不透明的变更签名（blake3 摘要的十六进制形式）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeSignature(String);

impl ChangeSignature {
    /// 由任意 `(键, 值)` 集合计算签名。
    ///
    /// 去掉首尾空白后为空的值会被忽略；键值对先按键排序，结果与传入顺序无关。
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut entries: Vec<(&str, &str)> = pairs
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        entries.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for (key, value) in entries {
            // 长度前缀，避免 "a:bc" 与 "ab:c" 之类的拼接歧义
            hasher.update(&(key.len() as u64).to_le_bytes());
            hasher.update(key.as_bytes());
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }

        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn of(inputs: &SourceInputs) -> Self {
        Self::from_pairs(inputs.pairs().map(|(key, value)| -> (&str, &str) { (key, value) }))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
