//! # 输入声明
//!
//! 宿主在绘制节点、校验连线前会查询节点的输入声明与元信息。
//! 这里的结构与宿主的 JSON 约定一一对应，通过 `serde` 直接序列化。

use std::collections::BTreeMap;

use serde::Serialize;

/// 节点元信息。
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub return_types: [&'static str; 2],
    pub return_names: [&'static str; 2],
    pub output_node: bool,
}

pub const NODE_INFO: NodeInfo = NodeInfo {
    name: "ImageLoader",
    display_name: "Image Loader (Universal)",
    category: "image/loaders",
    return_types: ["IMAGE", "MASK"],
    return_names: ["image", "mask"],
    output_node: false,
};

/// 单个输入字段的声明。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// `STRING` 或 `COMBO`。
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `COMBO` 的可选值。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub default: String,
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub tooltip: &'static str,
    /// 只能由连线/前端脚本写入，不在界面上显示输入框。
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_input: bool,
    /// 在界面上附带上传按钮。
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub image_upload: bool,
}

impl FieldSpec {
    fn string(tooltip: &'static str) -> Self {
        Self {
            kind: "STRING",
            options: None,
            default: String::new(),
            multiline: false,
            placeholder: None,
            tooltip,
            force_input: false,
            image_upload: false,
        }
    }
}

/// 节点输入声明。四个字段都是可选的。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSchema {
    pub required: BTreeMap<&'static str, FieldSpec>,
    pub optional: BTreeMap<&'static str, FieldSpec>,
}

impl InputSchema {
    /// 以当前输入目录列表作为 `upload` 的取值范围构建声明。
    pub fn build(mut input_files: Vec<String>) -> Self {
        input_files.sort();
        let upload_default = input_files.first().cloned().unwrap_or_default();

        let mut optional = BTreeMap::new();
        optional.insert(
            "pasted",
            FieldSpec {
                force_input: true,
                ..FieldSpec::string("Hidden input populated by the frontend when pasting images")
            },
        );
        optional.insert(
            "filepath",
            FieldSpec::string("Path to image file (relative to the input directory)"),
        );
        optional.insert(
            "base64",
            FieldSpec {
                multiline: true,
                placeholder: Some("Paste base64 encoded image data here..."),
                ..FieldSpec::string("Base64 encoded image string (with or without data URL prefix)")
            },
        );
        optional.insert(
            "upload",
            FieldSpec {
                kind: "COMBO",
                options: Some(input_files),
                default: upload_default,
                image_upload: true,
                ..FieldSpec::string("Image file selected from the input directory")
            },
        );

        Self {
            required: BTreeMap::new(),
            optional,
        }
    }
}
