//! 连接配置
//!
//! 配置记录由核心消费而不拥有：broker 地址、凭据、keepalive、QoS、
//! 连接超时由外层（配置文件、CLI 等）组装后传给
//! [`PublishSession::connect`](crate::PublishSession::connect)。
//! 本 crate 不定义任何配置文件格式。

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// 传输层投递保证等级
///
/// 语义完全由 Broker 按协议解释（如 MQTT QoS 0/1/2），
/// 本 crate 只负责透传。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum QoS {
    /// 至多一次（发后即忘）
    AtMostOnce = 0,
    /// 至少一次（broker 确认）
    #[default]
    AtLeastOnce = 1,
    /// 恰好一次
    ExactlyOnce = 2,
}

/// 认证凭据
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Broker 连接配置
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// keepalive 间隔（秒）
    pub keepalive: Duration,
    /// 未提供则匿名连接
    pub credentials: Option<Credentials>,
    /// mqtts:// 连接置位
    pub use_tls: bool,
    /// 未提供则由 Broker 实现自行生成
    pub client_id: Option<String>,
    /// 等待连接确认的超时（默认 5 秒）
    pub connect_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            keepalive: Duration::from_secs(60),
            credentials: None,
            use_tls: false,
            client_id: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl BrokerConfig {
    /// 从 broker URL 解析配置
    ///
    /// 支持 `tcp://host[:port]`、`mqtt://host[:port]`（默认端口 1883）
    /// 与 `mqtts://host[:port]`（TLS，默认端口 8883）。
    pub fn from_url(broker_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(broker_url)?;
        let use_tls = match url.scheme() {
            "tcp" | "mqtt" => false,
            "mqtts" => true,
            scheme => return Err(ConfigError::UnsupportedScheme(scheme.to_string())),
        };
        let host = url
            .host_str()
            .ok_or(ConfigError::MissingHost)?
            .to_string();
        let port = url.port().unwrap_or(if use_tls { 8883 } else { 1883 });
        Ok(Self {
            host,
            port,
            use_tls,
            ..Self::default()
        })
    }

    /// 设置凭据（用户名/密码都非空才生效，否则保持匿名）
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        if !username.is_empty() && !password.is_empty() {
            self.credentials = Some(Credentials {
                username: username.to_string(),
                password: password.to_string(),
            });
        }
        self
    }
}

/// 配置解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported broker URL scheme: {0:?} (expected tcp://, mqtt:// or mqtts://)")]
    UnsupportedScheme(String),

    #[error("broker URL has no host")]
    MissingHost,

    #[error("invalid broker URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
