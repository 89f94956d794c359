//! NLU 层：Dialogflow v1 / v2 适配与实现（HTTP / Mock）

pub mod auth;
pub mod http;
pub mod mock;
pub mod traits;
pub mod v1;
pub mod v2;

pub use auth::ServiceAccountAuth;
pub use http::{HttpAgentClient, HttpSessionsClient};
pub use mock::{MockAgentClient, MockSessionsClient};
pub use traits::{AgentClient, NluApi, SessionsClient};
pub use v1::{TextRequest, V1Api};
pub use v2::{DetectIntentRequest, V2Api};

use crate::config::{AdapterConfig, ApiVersion};
use crate::core::ConfigError;

/// 按配置版本创建 HTTP 适配器（唯一的版本分派点）
pub fn create_api(config: &AdapterConfig) -> Result<Box<dyn NluApi>, ConfigError> {
    let http = reqwest::Client::new();
    let base_url = config.api_base_url.as_deref();

    match config.version {
        ApiVersion::V1 => {
            let token = config.token.clone().ok_or(ConfigError::MissingToken)?;
            tracing::info!("Using Dialogflow v1 API");
            Ok(Box::new(V1Api::new(HttpAgentClient::new(http, token, base_url))))
        }
        ApiVersion::V2 => {
            let (Some(project_id), Some(credentials)) =
                (config.project_id.clone(), config.credentials.clone())
            else {
                return Err(ConfigError::MissingCredentials);
            };
            tracing::info!(project_id = %project_id, "Using Dialogflow v2 API");
            let auth = ServiceAccountAuth::new(http.clone(), credentials);
            Ok(Box::new(V2Api::new(
                project_id,
                HttpSessionsClient::new(http, auth, base_url),
            )))
        }
    }
}
