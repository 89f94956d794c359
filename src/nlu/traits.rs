//! NLU 适配层抽象
//!
//! - `NluApi`：中间件唯一依赖的能力，`query(session_id, language_code, text)` 返回标准化结果
//! - `AgentClient` / `SessionsClient`：分别对应 v1 REST 与 v2 的厂商调用边界，HTTP 实现与 Mock 均实现它们

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ApiVersion;
use crate::core::NluError;
use crate::message::NormalizedResult;

use super::v1::TextRequest;
use super::v2::DetectIntentRequest;

/// 版本无关的 Dialogflow 查询接口
#[async_trait]
pub trait NluApi: Send + Sync {
    /// 构造时确定的 API 版本
    fn version(&self) -> ApiVersion;

    /// 发送一次文本查询；失败原样返回，不重试
    async fn query(
        &self,
        session_id: &str,
        language_code: &str,
        text: &str,
    ) -> Result<NormalizedResult, NluError>;
}

/// v1 `/query` 调用边界，返回原始 JSON 响应
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn text_request(&self, request: &TextRequest) -> Result<Value, NluError>;
}

/// v2 `detectIntent` 调用边界，返回原始响应（parameters 为 struct proto 形式）
#[async_trait]
pub trait SessionsClient: Send + Sync {
    /// 会话资源路径
    fn session_path(&self, project_id: &str, session_id: &str) -> String {
        format!("projects/{}/agent/sessions/{}", project_id, session_id)
    }

    async fn detect_intent(&self, request: &DetectIntentRequest) -> Result<Value, NluError>;
}

#[async_trait]
impl<T: AgentClient + ?Sized> AgentClient for Arc<T> {
    async fn text_request(&self, request: &TextRequest) -> Result<Value, NluError> {
        (**self).text_request(request).await
    }
}

#[async_trait]
impl<T: SessionsClient + ?Sized> SessionsClient for Arc<T> {
    fn session_path(&self, project_id: &str, session_id: &str) -> String {
        (**self).session_path(project_id, session_id)
    }

    async fn detect_intent(&self, request: &DetectIntentRequest) -> Result<Value, NluError> {
        (**self).detect_intent(request).await
    }
}
