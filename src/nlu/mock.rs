//! Mock Dialogflow 客户端（用于测试与离线演示，无需网络）
//!
//! 返回预设的原始响应或预设错误，并记录最后一次请求。

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::core::NluError;

use super::traits::{AgentClient, SessionsClient};
use super::v1::TextRequest;
use super::v2::DetectIntentRequest;

#[derive(Debug, Clone)]
enum Canned {
    Response(Value),
    Failure { status: u16, body: String },
}

impl Canned {
    fn reply(&self) -> Result<Value, NluError> {
        match self {
            Canned::Response(v) => Ok(v.clone()),
            Canned::Failure { status, body } => Err(NluError::Service {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// v1 Mock
#[derive(Debug)]
pub struct MockAgentClient {
    canned: Canned,
    last_request: Mutex<Option<TextRequest>>,
}

impl MockAgentClient {
    pub fn responding(response: Value) -> Self {
        Self {
            canned: Canned::Response(response),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            canned: Canned::Failure {
                status,
                body: body.into(),
            },
            last_request: Mutex::new(None),
        }
    }

    pub async fn last_request(&self) -> Option<TextRequest> {
        self.last_request.lock().await.clone()
    }
}

#[async_trait]
impl AgentClient for MockAgentClient {
    async fn text_request(&self, request: &TextRequest) -> Result<Value, NluError> {
        *self.last_request.lock().await = Some(request.clone());
        self.canned.reply()
    }
}

/// v2 Mock
#[derive(Debug)]
pub struct MockSessionsClient {
    canned: Canned,
    last_request: Mutex<Option<DetectIntentRequest>>,
}

impl MockSessionsClient {
    pub fn responding(response: Value) -> Self {
        Self {
            canned: Canned::Response(response),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            canned: Canned::Failure {
                status,
                body: body.into(),
            },
            last_request: Mutex::new(None),
        }
    }

    pub async fn last_request(&self) -> Option<DetectIntentRequest> {
        self.last_request.lock().await.clone()
    }
}

#[async_trait]
impl SessionsClient for MockSessionsClient {
    async fn detect_intent(&self, request: &DetectIntentRequest) -> Result<Value, NluError> {
        *self.last_request.lock().await = Some(request.clone());
        self.canned.reply()
    }
}
