//! 会话 ID 生成
//!
//! 按配置的字段顺序取消息上的文本值（去首尾空白）直接拼接，取 MD5 十六进制摘要；
//! 拼接没有分隔符，字段应选用拼接后不会混淆的固定格式标识（如平台 user / channel ID）。
//! 所有字段都缺失时退化为随机的 v1 UUID，此时同一会话的连续性会丢失。

use md5::{Digest, Md5};
use uuid::Uuid;

use crate::message::Message;

/// 由消息字段派生会话 ID
pub fn generate_session_id<S: AsRef<str>>(session_id_props: &[S], message: &Message) -> String {
    let joined: Option<String> = session_id_props
        .iter()
        .filter_map(|prop| message.text_field(prop.as_ref()))
        .map(str::trim)
        .fold(None, |acc, value| {
            let mut acc = acc.unwrap_or_default();
            acc.push_str(value);
            Some(acc)
        });

    match joined {
        Some(content) => {
            let mut hasher = Md5::new();
            hasher.update(content.as_bytes());
            hex::encode(hasher.finalize())
        }
        None => {
            tracing::debug!("no session fields present on message, using random session id");
            random_session_id()
        }
    }
}

fn random_session_id() -> String {
    let seed = Uuid::new_v4();
    let mut node_id = [0u8; 6];
    node_id.copy_from_slice(&seed.as_bytes()[..6]);
    Uuid::now_v1(&node_id).to_string()
}
