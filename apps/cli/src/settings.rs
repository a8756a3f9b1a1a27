//! CLI 配置文件
//!
//! 与原始 `config.json` 形状一致：
//!
//! ```json
//! {
//!   "mqtt": { "broker_url": "tcp://localhost:1883", "username": "",
//!             "password": "", "keepalive": 60, "qos": 1 },
//!   "device": { "token": "hw2020515" }
//! }
//! ```
//!
//! 文件缺失时回退到默认值（并告警），字段缺失时逐字段回退。

use anyhow::{Context, Result};
use cup_client::{BrokerConfig, QoS};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mqtt: MqttSettings,
    pub device: DeviceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub broker_url: String,
    pub username: String,
    pub password: String,
    pub keepalive: u64,
    pub qos: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub token: String,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            broker_url: "tcp://localhost:1883".to_string(),
            username: String::new(),
            password: String::new(),
            keepalive: 60,
            qos: 1,
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            token: "hw2020515".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mqtt: MqttSettings::default(),
            device: DeviceSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(_) => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// 组装传给会话的连接配置
    pub fn broker_config(&self) -> Result<BrokerConfig> {
        let mut config = BrokerConfig::from_url(&self.mqtt.broker_url)
            .with_context(|| format!("bad broker URL {:?}", self.mqtt.broker_url))?
            .with_credentials(&self.mqtt.username, &self.mqtt.password);
        config.keepalive = Duration::from_secs(self.mqtt.keepalive);
        Ok(config)
    }

    pub fn qos(&self) -> Result<QoS> {
        QoS::try_from(self.mqtt.qos)
            .with_context(|| format!("qos must be 0, 1 or 2, got {}", self.mqtt.qos))
    }
}
