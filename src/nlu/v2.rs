//! Dialogflow /v2 适配
//!
//! 每次请求都带 `resetContexts: true`，不在服务端累积多轮上下文。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ApiVersion;
use crate::core::NluError;
use crate::message::{Fulfillment, NormalizedResult};
use crate::structjson::{struct_proto_to_json, StructProto};

use super::traits::{NluApi, SessionsClient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentRequest {
    pub session: String,
    pub query_input: QueryInput,
    pub query_params: QueryParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryInput {
    pub text: TextInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInput {
    pub text: String,
    pub language_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameters {
    pub reset_contexts: bool,
}

/// detectIntent 响应中本层读取的部分
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectIntentResponse {
    pub response_id: Option<String>,
    pub query_result: Option<QueryResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryResult {
    pub query_text: Option<String>,
    pub action: Option<String>,
    pub parameters: Option<StructProto>,
    pub fulfillment_text: Option<String>,
    pub fulfillment_messages: Option<Vec<Value>>,
    pub intent: Option<IntentRef>,
    pub intent_detection_confidence: Option<f64>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntentRef {
    pub name: Option<String>,
    pub display_name: Option<String>,
}

pub struct V2Api<C: SessionsClient> {
    client: C,
    project_id: String,
}

impl<C: SessionsClient> V2Api<C> {
    pub fn new(project_id: impl Into<String>, client: C) -> Self {
        Self {
            client,
            project_id: project_id.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn build_request(&self, session_id: &str, language_code: &str, text: &str) -> DetectIntentRequest {
        DetectIntentRequest {
            session: self.client.session_path(&self.project_id, session_id),
            query_input: QueryInput {
                text: TextInput {
                    text: text.to_string(),
                    language_code: language_code.to_string(),
                },
            },
            query_params: QueryParameters {
                reset_contexts: true,
            },
        }
    }
}

#[async_trait]
impl<C: SessionsClient> NluApi for V2Api<C> {
    fn version(&self) -> ApiVersion {
        ApiVersion::V2
    }

    async fn query(
        &self,
        session_id: &str,
        language_code: &str,
        text: &str,
    ) -> Result<NormalizedResult, NluError> {
        let request = self.build_request(session_id, language_code, text);
        let response = self.client.detect_intent(&request).await?;
        normalize(response)
    }
}

/// v2 响应 -> 标准化结果；`queryResult` 缺失视为响应畸形，其余字段缺失记为空
pub fn normalize(response: Value) -> Result<NormalizedResult, NluError> {
    let parsed: DetectIntentResponse = serde_json::from_value(response.clone())
        .map_err(|e| NluError::MalformedResponse(format!("v2 response: {}", e)))?;
    let result = parsed
        .query_result
        .ok_or_else(|| NluError::MalformedResponse("v2 response has no queryResult".to_string()))?;

    Ok(NormalizedResult {
        intent: result.intent.and_then(|i| i.display_name),
        entities: struct_proto_to_json(result.parameters.as_ref()),
        action: result.action,
        fulfillment: Fulfillment {
            text: result.fulfillment_text,
            messages: result.fulfillment_messages.unwrap_or_default(),
        },
        confidence: result.intent_detection_confidence,
        nlp_response: response,
    })
}
