//! 入站消息与标准化 NLU 结果
//!
//! `Message` 属于外部聊天框架，这里只描述中间件读写到的字段；其余平台字段保存在 `extra` 里原样透传。

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// 建议回复内容（文本 + 平台相关的富消息，富消息对本层不透明）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub text: Option<String>,
    #[serde(default)]
    pub messages: Vec<Value>,
}

/// 标准化 NLU 结果：v1 / v2 响应都归一到这个形状
///
/// 所有字段总是存在；后端没给的值序列化为 `null`，而不是省略键。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// 命中意图的显示名
    pub intent: Option<String>,
    /// 参数名 -> 抽取到的值（可嵌套）
    pub entities: Map<String, Value>,
    /// 意图关联的动作标识
    pub action: Option<String>,
    pub fulfillment: Fulfillment,
    /// 意图识别置信度 [0, 1]
    pub confidence: Option<f64>,
    /// 未经修改的后端原始响应
    pub nlp_response: Value,
}

/// 聊天框架的入站消息
///
/// `user` / `channel` / `lang` 按原样保存：平台可能给出数字 ID，只有字符串值参与会话 ID 与语言选择。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub msg_type: Option<String>,
    #[serde(rename = "is_echo", default)]
    pub is_echo: bool,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub channel: Option<Value>,
    /// 消息自带语言，优先于配置中的默认语言
    #[serde(default)]
    pub lang: Option<Value>,

    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub entities: Option<Map<String, Value>>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub fulfillment: Option<Fulfillment>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub nlp_response: Option<Value>,

    /// 平台相关的其他字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 写入可选字段；`keep_null` 为 true 时缺失值写成 `null`
fn write_optional<M, T>(map: &mut M, key: &str, value: &Option<T>, keep_null: bool) -> Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize,
{
    if value.is_some() || keep_null {
        map.serialize_entry(key, value)?;
    }
    Ok(())
}

/// 未标注的消息只输出已有字段；标注后六个结果字段总是输出，缺失值为 `null`
impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        write_optional(&mut map, "text", &self.text, false)?;
        write_optional(&mut map, "type", &self.msg_type, false)?;
        if self.is_echo {
            map.serialize_entry("is_echo", &true)?;
        }
        write_optional(&mut map, "user", &self.user, false)?;
        write_optional(&mut map, "channel", &self.channel, false)?;
        write_optional(&mut map, "lang", &self.lang, false)?;

        let annotated = self.is_annotated();
        write_optional(&mut map, "intent", &self.intent, annotated)?;
        write_optional(&mut map, "entities", &self.entities, annotated)?;
        write_optional(&mut map, "action", &self.action, annotated)?;
        write_optional(&mut map, "fulfillment", &self.fulfillment, annotated)?;
        write_optional(&mut map, "confidence", &self.confidence, annotated)?;
        write_optional(&mut map, "nlpResponse", &self.nlp_response, annotated)?;

        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Message {
    pub fn new(msg_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            msg_type: Some(msg_type.into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(Value::String(user.into()));
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(Value::String(channel.into()));
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(Value::String(lang.into()));
        self
    }

    /// 设置任意平台字段
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// 按字段名取文本值：先查已知字段，再查 `extra`；非字符串视为不存在
    pub fn text_field(&self, name: &str) -> Option<&str> {
        let known = match name {
            "text" => self.text.as_deref(),
            "type" => self.msg_type.as_deref(),
            "user" => self.user.as_ref().and_then(Value::as_str),
            "channel" => self.channel.as_ref().and_then(Value::as_str),
            "lang" => self.lang.as_ref().and_then(Value::as_str),
            "intent" => self.intent.as_deref(),
            "action" => self.action.as_deref(),
            _ => None,
        };
        known.or_else(|| self.extra.get(name).and_then(Value::as_str))
    }

    /// 将 NLU 结果合并到消息上，覆盖同名字段
    pub fn annotate(&mut self, result: NormalizedResult) {
        self.intent = result.intent;
        self.entities = Some(result.entities);
        self.action = result.action;
        self.fulfillment = Some(result.fulfillment);
        self.confidence = result.confidence;
        self.nlp_response = Some(result.nlp_response);
    }

    /// 是否已被 receive 标注过
    pub fn is_annotated(&self) -> bool {
        self.nlp_response.is_some()
    }
}
