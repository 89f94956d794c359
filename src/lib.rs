//! Dialogflow 中间件 - 聊天机器人入站消息的意图识别
//!
//! 模块划分：
//! - **config**: 配置加载（TOML + 环境变量）与校验（版本、凭据来源、默认值）
//! - **core**: 错误类型
//! - **message**: 入站消息与标准化 NLU 结果
//! - **middleware**: receive / hears / action 三个入口
//! - **nlu**: Dialogflow v1 / v2 适配（HTTP / Mock）
//! - **observability**: 日志初始化
//! - **patterns**: hears / action 的模式归一化
//! - **session**: 会话 ID 生成
//! - **structjson**: struct proto 与普通 JSON 互转

pub mod config;
pub mod core;
pub mod message;
pub mod middleware;
pub mod nlu;
pub mod observability;
pub mod patterns;
pub mod session;
pub mod structjson;

pub use config::{check_options, load_config, AdapterConfig, ApiVersion, RawConfig};
pub use message::{Fulfillment, Message, NormalizedResult};
pub use middleware::{DialogflowMiddleware, InboundMiddleware, ReceiveOutcome};
