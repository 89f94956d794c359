//! 模式归一化
//!
//! 聊天框架允许 hears / action 的模式是：单个正则、逗号分隔的字符串，或字符串与正则混合的数组。
//! 这里统一转成有序的正则列表：字符串元素视为正则源码，整体锚定（^...$）且忽略大小写；
//! 正则元素原样保留（不再加锚点，保留调用方自己的标志）。

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer};

use crate::core::PatternError;

/// 数组中的单个模式
#[derive(Debug, Clone)]
pub enum PatternItem {
    Text(String),
    Regex(Regex),
}

/// 调用方传入的模式描述
#[derive(Debug, Clone)]
pub enum PatternSpec {
    /// 单个正则，原样使用
    Regex(Regex),
    /// 逗号分隔的字符串，每段都是一个模式
    Text(String),
    /// 字符串 / 正则混合数组
    List(Vec<PatternItem>),
}

impl From<&str> for PatternItem {
    fn from(s: &str) -> Self {
        PatternItem::Text(s.to_string())
    }
}

impl From<String> for PatternItem {
    fn from(s: String) -> Self {
        PatternItem::Text(s)
    }
}

impl From<Regex> for PatternItem {
    fn from(re: Regex) -> Self {
        PatternItem::Regex(re)
    }
}

impl From<&str> for PatternSpec {
    fn from(s: &str) -> Self {
        PatternSpec::Text(s.to_string())
    }
}

impl From<String> for PatternSpec {
    fn from(s: String) -> Self {
        PatternSpec::Text(s)
    }
}

impl From<Regex> for PatternSpec {
    fn from(re: Regex) -> Self {
        PatternSpec::Regex(re)
    }
}

impl From<Vec<PatternItem>> for PatternSpec {
    fn from(items: Vec<PatternItem>) -> Self {
        PatternSpec::List(items)
    }
}

impl From<Vec<&str>> for PatternSpec {
    fn from(items: Vec<&str>) -> Self {
        PatternSpec::List(items.into_iter().map(PatternItem::from).collect())
    }
}

impl From<Vec<String>> for PatternSpec {
    fn from(items: Vec<String>) -> Self {
        PatternSpec::List(items.into_iter().map(PatternItem::from).collect())
    }
}

impl From<&[&str]> for PatternSpec {
    fn from(items: &[&str]) -> Self {
        PatternSpec::List(items.iter().map(|s| PatternItem::from(*s)).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PatternSpec {
    fn from(items: [&str; N]) -> Self {
        PatternSpec::List(items.iter().map(|s| PatternItem::from(*s)).collect())
    }
}

/// 配置文件中只能写字符串或字符串数组（正则只能以源码字符串给出）
impl<'de> Deserialize<'de> for PatternSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(s) => PatternSpec::Text(s),
            Raw::Many(items) => PatternSpec::from(items),
        })
    }
}

/// 将模式描述转为有序正则列表（保持输入顺序，不去重）
pub fn normalize(spec: &PatternSpec) -> Result<Vec<Regex>, PatternError> {
    match spec {
        PatternSpec::Regex(re) => Ok(vec![re.clone()]),
        PatternSpec::Text(text) => text.split(',').map(anchored).collect(),
        PatternSpec::List(items) => items
            .iter()
            .map(|item| match item {
                PatternItem::Text(s) => anchored(s),
                PatternItem::Regex(re) => Ok(re.clone()),
            })
            .collect(),
    }
}

/// 任意一个模式整体匹配 `value` 即返回 true
pub fn any_match(patterns: &[Regex], value: &str) -> bool {
    patterns.iter().any(|p| p.is_match(value))
}

/// 字符串 -> `^(?:s)$`，忽略大小写
///
/// 用非捕获组包住源码，保证 `a|b` 这类交替也是整体锚定。
fn anchored(source: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(&format!("^(?:{})$", source))
        .case_insensitive(true)
        .build()
        .map_err(|e| PatternError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })
}
