//! 中间件错误类型
//!
//! - `ConfigError`：构造期同步抛出，配置缺失或冲突
//! - `NluError`：调用 Dialogflow 失败或响应结构不可识别，原样交给 receive 的调用方
//! - `PatternError`：意图 / 动作模式无法编译为正则

use thiserror::Error;

/// 配置校验错误（构造适配器时立即失败，不做内部恢复）
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Dialogflow token must be provided for v1")]
    MissingToken,

    #[error("projectId and credentials required, either via keyfile, explicit fields or environment variables")]
    MissingCredentials,

    #[error("Invalid configuration - cannot provide both keyfile and explicit credentials")]
    ConflictingCredentials,

    #[error("Failed to read keyfile {path}: {reason}")]
    KeyFile { path: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Dialogflow 调用错误
#[derive(Error, Debug)]
pub enum NluError {
    /// 网络层失败（连接、TLS、请求超时等，由底层 HTTP 客户端决定）
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 服务端返回非 2xx
    #[error("Dialogflow service error ({status}): {body}")]
    Service { status: u16, body: String },

    /// 服务账号换取 access token 失败
    #[error("Auth error: {0}")]
    Auth(String),

    /// 响应缺少必需的顶层结构（单个可选字段缺失不属于此类）
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// 模式编译错误
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// receive 链路对外暴露的统一错误
#[derive(Error, Debug)]
pub enum MiddlewareError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Nlu(#[from] NluError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}
