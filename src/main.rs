//! 控制台示例机器人
//!
//! 每行输入作为一条 direct_message 送入中间件，打印识别到的意图、动作与建议回复。
//! 用法：`dialogflow-middleware [config.toml]`；`RUST_LOG=dialogflow_middleware=debug` 查看请求细节。

use std::path::PathBuf;

use anyhow::Context;
use dialogflow_middleware::{check_options, load_config, observability, DialogflowMiddleware, Message};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let raw = load_config(config_path).context("Failed to load config")?;
    let config = check_options(raw).context("Invalid Dialogflow configuration")?;
    let middleware = DialogflowMiddleware::from_config(config).context("Failed to create middleware")?;

    let user = std::env::var("USER").unwrap_or_else(|_| "console-user".to_string());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type a message (Ctrl-D to quit)");
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let mut message = Message::new("direct_message", line.trim())
            .with_user(user.as_str())
            .with_channel("console");

        if let Err(e) = middleware.receive(&mut message).await {
            tracing::error!("Dialogflow error: {}", e);
            continue;
        }
        if !message.is_annotated() {
            continue;
        }

        println!(
            "intent={} action={} confidence={}",
            message.intent.as_deref().unwrap_or("-"),
            message.action.as_deref().unwrap_or("-"),
            message.confidence.map(|c| format!("{:.2}", c)).unwrap_or_else(|| "-".to_string()),
        );
        if let Some(text) = message.fulfillment.as_ref().and_then(|f| f.text.as_deref()) {
            println!("bot: {}", text);
        }
    }

    Ok(())
}
