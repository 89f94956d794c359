//! Struct proto 与普通 JSON 互转
//!
//! v2 接口的 `parameters` 使用 google.protobuf.Struct 的带标签表示：
//! `{"fields": {"k": {"kind": "stringValue", "stringValue": "v"}}}`。
//! 值类型是封闭集合（null / number / string / bool / struct / list），两个方向都是递归、全函数。
//!
//! proto 数字只有 f64：整数值的浮点数（如 `2.0`）转回 JSON 时写成整数 `2`，
//! 因此 JSON -> proto -> JSON 只在这类数字上不保持 `serde_json` 意义下的相等；NaN / 无穷写成 `null`。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// google.protobuf.Struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructProto {
    #[serde(default)]
    pub fields: BTreeMap<String, ProtoValue>,
}

/// google.protobuf.ListValue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListValue {
    #[serde(default)]
    pub values: Vec<ProtoValue>,
}

/// google.protobuf.NullValue 唯一的取值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullValue {
    #[default]
    #[serde(rename = "NULL_VALUE")]
    NullValue,
}

/// google.protobuf.Value：以 `kind` 为判别字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProtoValue {
    #[serde(rename = "nullValue")]
    Null {
        #[serde(rename = "nullValue", default)]
        null_value: NullValue,
    },
    #[serde(rename = "numberValue")]
    Number {
        #[serde(rename = "numberValue")]
        number_value: f64,
    },
    #[serde(rename = "stringValue")]
    String {
        #[serde(rename = "stringValue")]
        string_value: String,
    },
    #[serde(rename = "boolValue")]
    Bool {
        #[serde(rename = "boolValue")]
        bool_value: bool,
    },
    #[serde(rename = "structValue")]
    Struct {
        #[serde(rename = "structValue")]
        struct_value: StructProto,
    },
    #[serde(rename = "listValue")]
    List {
        #[serde(rename = "listValue")]
        list_value: ListValue,
    },
}

impl ProtoValue {
    pub fn null() -> Self {
        ProtoValue::Null {
            null_value: NullValue::NullValue,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        ProtoValue::String {
            string_value: s.into(),
        }
    }
}

/// Struct proto -> 普通对象；`None` 得到空对象
pub fn struct_proto_to_json(proto: Option<&StructProto>) -> Map<String, Value> {
    let Some(proto) = proto else {
        return Map::new();
    };
    proto
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), value_proto_to_json(v)))
        .collect()
}

/// 普通对象 -> Struct proto；`None` 得到 `{fields: {}}`
pub fn json_to_struct_proto(json: Option<&Map<String, Value>>) -> StructProto {
    let Some(json) = json else {
        return StructProto::default();
    };
    StructProto {
        fields: json
            .iter()
            .map(|(k, v)| (k.clone(), json_to_value_proto(v)))
            .collect(),
    }
}

pub fn value_proto_to_json(value: &ProtoValue) -> Value {
    match value {
        ProtoValue::Null { .. } => Value::Null,
        ProtoValue::Number { number_value } => number_to_json(*number_value),
        ProtoValue::String { string_value } => Value::String(string_value.clone()),
        ProtoValue::Bool { bool_value } => Value::Bool(*bool_value),
        ProtoValue::Struct { struct_value } => {
            Value::Object(struct_proto_to_json(Some(struct_value)))
        }
        ProtoValue::List { list_value } => {
            Value::Array(list_value.values.iter().map(value_proto_to_json).collect())
        }
    }
}

pub fn json_to_value_proto(value: &Value) -> ProtoValue {
    match value {
        Value::Null => ProtoValue::null(),
        Value::Number(n) => ProtoValue::Number {
            number_value: n.as_f64().unwrap_or(f64::NAN),
        },
        Value::String(s) => ProtoValue::string(s.clone()),
        Value::Bool(b) => ProtoValue::Bool { bool_value: *b },
        Value::Object(map) => ProtoValue::Struct {
            struct_value: json_to_struct_proto(Some(map)),
        },
        Value::Array(items) => ProtoValue::List {
            list_value: ListValue {
                values: items.iter().map(json_to_value_proto).collect(),
            },
        },
    }
}

/// proto 数字只有 f64；整数值还原为 JSON 整数，非有限值（JSON 无法表示）记为 null
fn number_to_json(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}
