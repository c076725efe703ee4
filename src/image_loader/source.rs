//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入字段”和“流水线中间结果”解耦：
//! - `SourceInputs` 表示宿主传入的四个可选字段
//! - `SourceKind` 表示来源语义（同时决定优先级顺序）
//! - `RawImageData` 表示已加载但未解码的字节

use std::fmt;

/// 宿主传入的四个可选输入字段。
///
/// 每个字段要么缺省，要么是宿主给出的原始字符串（可能为空白或 `"null"`）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInputs {
    /// 剪贴板粘贴（由前端脚本写入的 base64 / Data URL）。
    pub pasted: Option<String>,
    /// 文件路径（绝对路径或相对输入目录）。
    pub filepath: Option<String>,
    /// 用户填写的 base64 / Data URL。
    pub base64: Option<String>,
    /// 从输入目录列表中选择的文件名。
    pub upload: Option<String>,
}

impl SourceInputs {
    pub fn with_pasted(mut self, value: impl Into<String>) -> Self {
        self.pasted = Some(value.into());
        self
    }

    pub fn with_filepath(mut self, value: impl Into<String>) -> Self {
        self.filepath = Some(value.into());
        self
    }

    pub fn with_base64(mut self, value: impl Into<String>) -> Self {
        self.base64 = Some(value.into());
        self
    }

    pub fn with_upload(mut self, value: impl Into<String>) -> Self {
        self.upload = Some(value.into());
        self
    }

    /// 读取指定来源对应的字段原值。
    pub fn get(&self, kind: SourceKind) -> Option<&str> {
        match kind {
            SourceKind::Pasted => self.pasted.as_deref(),
            SourceKind::FilePath => self.filepath.as_deref(),
            SourceKind::Base64 => self.base64.as_deref(),
            SourceKind::Upload => self.upload.as_deref(),
        }
    }

    /// 以 `(字段名, 原值)` 形式列出所有已提供的字段。
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        SourceKind::PRECEDENCE
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|value| (kind.field_name(), value)))
    }
}

/// 图片输入来源。
///
/// 声明顺序即优先级顺序：粘贴 > 文件路径 > base64 > 上传。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Pasted,
    FilePath,
    Base64,
    Upload,
}

impl SourceKind {
    /// 优先级链，从高到低。
    pub const PRECEDENCE: [SourceKind; 4] = [
        SourceKind::Pasted,
        SourceKind::FilePath,
        SourceKind::Base64,
        SourceKind::Upload,
    ];

    /// 宿主协议中的字段名。
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Pasted => "pasted",
            Self::FilePath => "filepath",
            Self::Base64 => "base64",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// 加载阶段输出：原始字节与来源标识。
#[derive(Debug, Clone)]
pub struct RawImageData {
    /// 原始图片字节。
    pub bytes: Vec<u8>,
    /// 实际命中的来源。
    pub source: SourceKind,
    /// 来源提示（用于日志与诊断），如 `Clipboard Paste`、`File: a.png`。
    pub label: String,
}

/// 判断输入值是否“有效”：非空、去掉首尾空白后非空、且不等于（忽略大小写的）`null`。
pub fn is_valid_input(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(trimmed) => !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("null"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_input_rejects_blank_and_null_literals() {
        assert!(!is_valid_input(None));
        assert!(!is_valid_input(Some("")));
        assert!(!is_valid_input(Some("  \n\t")));
        assert!(!is_valid_input(Some("null")));
        assert!(!is_valid_input(Some(" NuLL ")));
        assert!(is_valid_input(Some("nullable.png")));
        assert!(is_valid_input(Some(" a.png ")));
    }

    #[test]
    fn precedence_matches_declaration_order() {
        let mut sorted = SourceKind::PRECEDENCE;
        sorted.sort();
        assert_eq!(sorted, SourceKind::PRECEDENCE);
        assert_eq!(SourceKind::PRECEDENCE[0], SourceKind::Pasted);
        assert_eq!(SourceKind::PRECEDENCE[3], SourceKind::Upload);
    }

    #[test]
    fn pairs_lists_only_provided_fields() {
        let inputs = SourceInputs::default().with_base64("abc").with_upload("");
        let pairs: Vec<_> = inputs.pairs().collect();
        assert_eq!(pairs, vec![("base64", "abc"), ("upload", "")]);
    }
}
