//! Dialogflow 中间件
//!
//! 聊天框架调用的三个入口：
//! - `receive`：入站消息过滤后送往 Dialogflow，结果合并到消息上
//! - `hears`：意图谓词（模式匹配 + 置信度阈值）
//! - `action`：动作谓词（同上，匹配 `message.action`）
//!
//! `receive` 返回的 `Result` 对应框架的 `next(error?)`：`Ok` 继续后续中间件，`Err` 中止并上报。

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{check_options, AdapterConfig, RawConfig};
use crate::core::{ConfigError, MiddlewareError};
use crate::message::Message;
use crate::nlu::{self, NluApi};
use crate::patterns::{self, PatternSpec};
use crate::session::generate_session_id;

const SELF_MESSAGE: &str = "self_message";

/// 单条消息经过 `receive` 后的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// 被过滤，消息未改动
    Forwarded,
    /// 已合并 NLU 结果
    Annotated,
}

/// 聊天框架入站管道的挂载点
#[async_trait]
pub trait InboundMiddleware: Send + Sync {
    async fn receive(&self, message: &mut Message) -> Result<ReceiveOutcome, MiddlewareError>;
}

pub struct DialogflowMiddleware {
    config: Arc<AdapterConfig>,
    api: Box<dyn NluApi>,
}

impl DialogflowMiddleware {
    /// 校验原始配置并创建对应版本的 HTTP 适配器
    pub fn new(raw: RawConfig) -> Result<Self, ConfigError> {
        Self::from_config(check_options(raw)?)
    }

    pub fn from_config(config: AdapterConfig) -> Result<Self, ConfigError> {
        let api = nlu::create_api(&config)?;
        Ok(Self::with_api(config, api))
    }

    /// 使用自定义适配器（测试桩、自建传输层）
    pub fn with_api(config: AdapterConfig, api: Box<dyn NluApi>) -> Self {
        tracing::info!(
            version = %api.version(),
            minimum_confidence = config.minimum_confidence,
            "Dialogflow middleware ready"
        );
        Self {
            config: Arc::new(config),
            api,
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn api(&self) -> &dyn NluApi {
        self.api.as_ref()
    }

    /// 标注入站消息；被过滤的消息原样放行，调用失败时消息不做任何修改
    pub async fn receive(&self, message: &mut Message) -> Result<ReceiveOutcome, MiddlewareError> {
        if let Some(reason) = self.skip_reason(message) {
            tracing::debug!(msg_type = ?message.msg_type, "skipping call to Dialogflow: {}", reason);
            return Ok(ReceiveOutcome::Forwarded);
        }
        let Some(text) = message.text.clone() else {
            return Ok(ReceiveOutcome::Forwarded);
        };

        let session_id = generate_session_id(&self.config.session_id_props, message);
        let lang = message
            .text_field("lang")
            .filter(|l| !l.is_empty())
            .map_or_else(|| self.config.lang.clone(), str::to_string);

        tracing::debug!(
            session_id = %session_id,
            lang = %lang,
            text = %text,
            "Sending message to Dialogflow"
        );

        match self.api.query(&session_id, &lang, &text).await {
            Ok(result) => {
                message.annotate(result);
                tracing::debug!(
                    intent = ?message.intent,
                    action = ?message.action,
                    confidence = ?message.confidence,
                    "Dialogflow annotated message"
                );
                Ok(ReceiveOutcome::Annotated)
            }
            Err(e) => {
                tracing::debug!("Dialogflow returned error: {}", e);
                Err(e.into())
            }
        }
    }

    /// 意图是否匹配任一模式且置信度达到阈值
    pub fn hears(&self, patterns: impl Into<PatternSpec>, message: &Message) -> bool {
        self.matches(&patterns.into(), message.intent.as_deref(), message, "intent")
    }

    /// 动作是否匹配任一模式且置信度达到阈值
    pub fn action(&self, patterns: impl Into<PatternSpec>, message: &Message) -> bool {
        self.matches(&patterns.into(), message.action.as_deref(), message, "action")
    }

    fn matches(&self, spec: &PatternSpec, field: Option<&str>, message: &Message, what: &str) -> bool {
        let patterns = match patterns::normalize(spec) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Ignoring invalid {} pattern: {}", what, e);
                return false;
            }
        };

        let (Some(value), Some(confidence)) = (field, message.confidence) else {
            return false;
        };
        if confidence < self.config.minimum_confidence {
            return false;
        }

        match patterns.iter().find(|p| p.is_match(value)) {
            Some(pattern) => {
                tracing::debug!("Dialogflow {} {:?} matched pattern {}", what, value, pattern);
                true
            }
            None => false,
        }
    }

    fn skip_reason(&self, message: &Message) -> Option<&'static str> {
        if message.text.as_deref().map_or(true, str::is_empty) {
            return Some("no text");
        }
        if message.is_echo {
            return Some("echo");
        }
        let msg_type = message.msg_type.as_deref()?;
        if msg_type == SELF_MESSAGE {
            return Some("self message");
        }
        if self.ignores_type(msg_type) {
            return Some("ignored type");
        }
        None
    }

    fn ignores_type(&self, msg_type: &str) -> bool {
        patterns::any_match(&self.config.ignore_type, msg_type)
    }
}

#[async_trait]
impl InboundMiddleware for DialogflowMiddleware {
    async fn receive(&self, message: &mut Message) -> Result<ReceiveOutcome, MiddlewareError> {
        DialogflowMiddleware::receive(self, message).await
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;
    use serde_json::json;

    use super::*;
    use crate::config::{check_options_with_env, CredentialEnv};
    use crate::core::NluError;
    use crate::nlu::{MockAgentClient, MockSessionsClient, V1Api, V2Api};

    fn hello_v2_response() -> serde_json::Value {
        json!({
            "responseId": "261d37f0-34ee-11e8-bcca-67db967c2594",
            "queryResult": {
                "fulfillmentMessages": [
                    {"platform": "PLATFORM_UNSPECIFIED", "text": {"text": ["Good day!"]}, "message": "text"}
                ],
                "queryText": "hi",
                "action": "hello-intent",
                "parameters": {"fields": {}},
                "fulfillmentText": "Good day!",
                "intent": {"displayName": "hello-intent"},
                "intentDetectionConfidence": 1,
                "languageCode": "en"
            },
            "webhookStatus": null
        })
    }

    fn v2_config(minimum_confidence: f64) -> AdapterConfig {
        let mut raw = RawConfig::v2(
            "botkit-middleware",
            crate::config::Credentials {
                private_key: "key".to_string(),
                client_email: "bot@example.com".to_string(),
            },
        );
        raw.minimum_confidence = Some(minimum_confidence);
        check_options_with_env(raw, &CredentialEnv::default()).unwrap()
    }

    fn v2_middleware(minimum_confidence: f64) -> DialogflowMiddleware {
        DialogflowMiddleware::with_api(
            v2_config(minimum_confidence),
            Box::new(V2Api::new(
                "botkit-middleware",
                MockSessionsClient::responding(hello_v2_response()),
            )),
        )
    }

    fn annotated(intent: &str, action: &str, confidence: f64) -> Message {
        let mut msg = Message::new("direct_message", "hi");
        msg.intent = Some(intent.to_string());
        msg.action = Some(action.to_string());
        msg.confidence = Some(confidence);
        msg
    }

    #[tokio::test]
    async fn test_receive_annotates_message() {
        let middleware = v2_middleware(0.5);
        let mut msg = Message::new("direct_message", "hi")
            .with_user("U891YCT42")
            .with_channel("D88V7BL2F");
        let outcome = middleware.receive(&mut msg).await.unwrap();
        assert_eq!(outcome, ReceiveOutcome::Annotated);
        assert_eq!(msg.intent.as_deref(), Some("hello-intent"));
        assert_eq!(msg.action.as_deref(), Some("hello-intent"));
        assert_eq!(msg.entities, Some(serde_json::Map::new()));
        assert_eq!(msg.confidence, Some(1.0));
        assert_eq!(msg.nlp_response, Some(hello_v2_response()));
        let fulfillment = msg.fulfillment.unwrap();
        assert_eq!(fulfillment.text.as_deref(), Some("Good day!"));
        assert_eq!(fulfillment.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_receive_skips_filtered_messages() {
        let middleware = v2_middleware(0.0);

        let mut typing = Message {
            msg_type: Some("user_typing".to_string()),
            ..Default::default()
        };
        let mut echo = Message::new("message", "hello");
        echo.is_echo = true;
        let mut own = Message::new("self_message", "Hello!");

        for msg in [&mut typing, &mut echo, &mut own] {
            let before = msg.clone();
            assert_eq!(middleware.receive(msg).await.unwrap(), ReceiveOutcome::Forwarded);
            assert_eq!(*msg, before);
        }
    }

    #[tokio::test]
    async fn test_receive_respects_ignore_type_patterns() {
        let mut raw = RawConfig::v1("abc123");
        raw.ignore_type = Some(PatternSpec::Regex(Regex::new("^facebook").unwrap()));
        let config = check_options_with_env(raw, &CredentialEnv::default()).unwrap();
        let middleware = DialogflowMiddleware::with_api(
            config,
            Box::new(V1Api::new(MockAgentClient::failing(500, "should not be called"))),
        );

        let mut msg = Message::new("facebook_postback", "payload");
        let before = msg.clone();
        assert_eq!(middleware.receive(&mut msg).await.unwrap(), ReceiveOutcome::Forwarded);
        assert_eq!(msg, before);
    }

    #[tokio::test]
    async fn test_receive_error_leaves_message_untouched() {
        let middleware = DialogflowMiddleware::with_api(
            v2_config(0.0),
            Box::new(V2Api::new("p", MockSessionsClient::failing(401, "unauthenticated"))),
        );
        let mut msg = Message::new("direct_message", "hi").with_user("U1");
        let before = msg.clone();
        let err = middleware.receive(&mut msg).await.unwrap_err();
        assert!(matches!(err, MiddlewareError::Nlu(NluError::Service { status: 401, .. })));
        assert_eq!(msg, before);
    }

    #[tokio::test]
    async fn test_receive_uses_message_language() {
        let client = Arc::new(MockAgentClient::responding(json!({"result": {"score": 0.8}})));
        let config = check_options_with_env(RawConfig::v1("abc123"), &CredentialEnv::default()).unwrap();
        let middleware = DialogflowMiddleware::with_api(config, Box::new(V1Api::new(client.clone())));

        let mut french = Message::new("direct_message", "bonjour")
            .with_user("test_user")
            .with_channel("test_channel")
            .with_lang("fr");
        middleware.receive(&mut french).await.unwrap();
        let request = client.last_request().await.unwrap();
        assert_eq!(request.lang, "fr");
        assert_eq!(request.query, "bonjour");
        assert_eq!(
            request.session_id,
            generate_session_id(&["user", "channel"], &french)
        );

        let mut english = Message::new("direct_message", "hi").with_user("test_user");
        middleware.receive(&mut english).await.unwrap();
        assert_eq!(client.last_request().await.unwrap().lang, "en");
    }

    #[test]
    fn test_hears_patterns() {
        let middleware = v2_middleware(0.5);
        let msg = annotated("hello-intent", "hello-intent", 1.0);
        assert!(middleware.hears(["hello-intent"], &msg));
        assert!(middleware.hears("hello-intent", &msg));
        assert!(middleware.hears("hello(.*)", &msg));
        assert!(middleware.hears("HELLO-intent", &msg));
        assert!(!middleware.hears("hello-in", &msg));
        assert!(middleware.hears(Regex::new("(?i)^HEl.*").unwrap(), &msg));
        assert!(middleware.hears(["blah", "hello-intent"], &msg));
        assert!(middleware.hears(
            vec![
                patterns::PatternItem::from("blah"),
                patterns::PatternItem::from(Regex::new("^(hello)").unwrap()),
            ],
            &msg
        ));
    }

    #[test]
    fn test_hears_requires_confidence() {
        let middleware = v2_middleware(0.5);
        let msg = annotated("hello-intent", "hello-intent", 0.1);
        assert!(!middleware.hears(["hello-intent"], &msg));

        let mut no_confidence = annotated("hello-intent", "hello-intent", 1.0);
        no_confidence.confidence = None;
        assert!(!v2_middleware(0.0).hears("hello-intent", &no_confidence));
    }

    #[test]
    fn test_action_patterns() {
        let middleware = v2_middleware(0.5);
        let msg = annotated("add-to-list", "pickFruit", 1.0);
        assert!(middleware.action(["pickFruit"], &msg));
        assert!(middleware.action("pick(.*)", &msg));
        assert!(middleware.action("pickFRUIT", &msg));
        assert!(!middleware.action("pick", &msg));
        assert!(middleware.action(Regex::new("^pick").unwrap(), &msg));
        assert!(!middleware.action("add-to-list", &msg));

        let low = annotated("add-to-list", "pickFruit", 0.1);
        assert!(!middleware.action(["pickFruit"], &low));
    }

    #[test]
    fn test_unannotated_message_never_matches() {
        let middleware = v2_middleware(0.0);
        let msg = Message::new("direct_message", "hi");
        assert!(!middleware.hears("(.*)", &msg));
        assert!(!middleware.action("(.*)", &msg));
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_invalid_pattern_never_matches() {
        let middleware = v2_middleware(0.0);
        let msg = annotated("hello-intent", "x", 1.0);
        assert!(!middleware.hears("hello(", &msg));
        assert!(logs_contain("Ignoring invalid intent pattern"));
    }
}
