//! Dialogflow HTTP 客户端（reqwest）
//!
//! - v1：`POST {base}/query?v=20150910`，Bearer 为客户端 access token
//! - v2：`POST {base}/v2/{session}:detectIntent`，Bearer 由服务账号换取
//!
//! REST 版 v2 把 `parameters` 编码成普通 JSON，这里转回 struct proto 形式，
//! 与 gRPC 接口返回的结构一致，上层只需处理一种形状。
//! 本层不设超时、不重试，由调用方配置 `reqwest::Client`。

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::NluError;
use crate::structjson::json_to_struct_proto;

use super::auth::ServiceAccountAuth;
use super::traits::{AgentClient, SessionsClient};
use super::v1::TextRequest;
use super::v2::{DetectIntentRequest, QueryInput, QueryParameters};

pub const DEFAULT_V1_BASE_URL: &str = "https://api.dialogflow.com/v1";
pub const DEFAULT_V2_BASE_URL: &str = "https://dialogflow.googleapis.com";
/// v1 协议版本（按日期）
pub const V1_PROTOCOL_VERSION: &str = "20150910";

/// 检查状态码，非 2xx 转为 `NluError::Service`
async fn read_json(resp: reqwest::Response) -> Result<Value, NluError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(NluError::Service {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json::<Value>().await?)
}

pub struct HttpAgentClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpAgentClient {
    pub fn new(http: reqwest::Client, token: impl Into<String>, base_url: Option<&str>) -> Self {
        Self {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_V1_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn text_request(&self, request: &TextRequest) -> Result<Value, NluError> {
        let url = format!("{}/query?v={}", self.base_url, V1_PROTOCOL_VERSION);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        read_json(resp).await
    }
}

/// REST 请求体不含 session（session 在路径中）
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentBody<'a> {
    query_input: &'a QueryInput,
    query_params: &'a QueryParameters,
}

pub struct HttpSessionsClient {
    http: reqwest::Client,
    base_url: String,
    auth: ServiceAccountAuth,
}

impl HttpSessionsClient {
    pub fn new(http: reqwest::Client, auth: ServiceAccountAuth, base_url: Option<&str>) -> Self {
        Self {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_V2_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            auth,
        }
    }
}

#[async_trait]
impl SessionsClient for HttpSessionsClient {
    async fn detect_intent(&self, request: &DetectIntentRequest) -> Result<Value, NluError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/v2/{}:detectIntent", self.base_url, request.session);
        let body = DetectIntentBody {
            query_input: &request.query_input,
            query_params: &request.query_params,
        };
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let raw = read_json(resp).await?;
        retag_parameters(raw)
    }
}

/// 把 `queryResult.parameters` 从普通 JSON 转为 struct proto
pub fn retag_parameters(mut raw: Value) -> Result<Value, NluError> {
    if let Some(params) = raw.pointer_mut("/queryResult/parameters") {
        let proto = json_to_struct_proto(params.as_object());
        *params = serde_json::to_value(proto)?;
    }
    Ok(raw)
}
