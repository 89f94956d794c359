//! Dialogflow /v1（REST）适配
//!
//! 语言作为每次请求的参数传给 `AgentClient`，不在客户端上保存“当前语言”，
//! 因此同一实例上不同语言的并发查询互不干扰。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ApiVersion;
use crate::core::NluError;
use crate::message::{Fulfillment, NormalizedResult};

use super::traits::{AgentClient, NluApi};

/// v1 `/query` 请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub query: String,
    pub session_id: String,
    pub lang: String,
}

pub struct V1Api<C: AgentClient> {
    client: C,
}

impl<C: AgentClient> V1Api<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: AgentClient> NluApi for V1Api<C> {
    fn version(&self) -> ApiVersion {
        ApiVersion::V1
    }

    async fn query(
        &self,
        session_id: &str,
        language_code: &str,
        text: &str,
    ) -> Result<NormalizedResult, NluError> {
        let request = TextRequest {
            query: text.to_string(),
            session_id: session_id.to_string(),
            lang: language_code.to_string(),
        };
        let response = self.client.text_request(&request).await?;
        normalize(response)
    }
}

/// v1 响应 -> 标准化结果；`result` 缺失视为响应畸形，其余字段缺失记为空
///
/// `fulfillment` 不原样透传，而是重建为 `{text: speech, messages}`；
/// `displayText`、`data` 等其余字段只能从 `nlp_response` 读取。
pub fn normalize(response: Value) -> Result<NormalizedResult, NluError> {
    let result = response
        .get("result")
        .filter(|r| r.is_object())
        .ok_or_else(|| NluError::MalformedResponse("v1 response has no result object".to_string()))?;

    let text_at = |pointer: &str| result.pointer(pointer).and_then(Value::as_str).map(String::from);

    let intent = text_at("/metadata/intentName");
    let action = text_at("/action");
    let entities = result
        .get("parameters")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let fulfillment = Fulfillment {
        text: text_at("/fulfillment/speech"),
        messages: result
            .pointer("/fulfillment/messages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    };
    let confidence = result.get("score").and_then(Value::as_f64);

    Ok(NormalizedResult {
        intent,
        entities,
        action,
        fulfillment,
        confidence,
        nlp_response: response,
    })
}
