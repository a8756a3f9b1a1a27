//! # Cup Client
//!
//! 设备指令发布客户端：Broker 抽象 + 发布会话状态机。
//!
//! ## 模块
//!
//! - `config`: 连接配置（地址、凭据、keepalive、QoS、超时）
//! - `broker`: 不透明传输协作者的 trait 接缝
//! - `session`: `PublishSession` 生命周期状态机与主题推导
//! - `mock`: 行为可配置的测试/回环 Broker（`mock` feature）
//!
//! ## 典型流程
//!
//! ```rust,ignore
//! use cup_client::{BrokerConfig, PublishSession, QoS, unix_time_ms};
//! use cup_protocol::{CommandType, MotionPayload, build_control, build_envelope};
//! use cup_protocol::ControlCommand;
//!
//! let control = build_control(ControlCommand::Reset, None, None)?;
//! let payload = MotionPayload::Control(control).encode();
//! let command = build_envelope("hw2020515", CommandType::Task, payload, unix_time_ms())?;
//!
//! let mut session = PublishSession::new(broker);
//! session.connect(&BrokerConfig::from_url("tcp://localhost:1883")?)?;
//! session.publish_command(&command, QoS::AtLeastOnce)?;
//! session.disconnect();
//! ```

pub mod broker;
pub mod config;
pub mod session;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// 重新导出常用类型
pub use broker::{Broker, ConnectAck, TransportError};
pub use config::{BrokerConfig, ConfigError, Credentials, QoS};
pub use session::{
    ConnectError, PublishError, PublishSession, SessionState, command_topic, unix_time_ms,
};
