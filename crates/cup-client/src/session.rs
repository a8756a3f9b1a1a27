//! 发布会话状态机
//!
//! 一个 [`PublishSession`] 实例独占一条 Broker 连接，串行化
//! connect → publish… → disconnect 生命周期，并按指令粒度报告
//! 成功/失败。
//!
//! ## 并发模型
//!
//! 单一控制流：调用方从一条控制流里依次调用，实例内部不加锁。
//! Broker 在后台异步送达确认；[`PublishSession::connect`] 是核心里
//! 唯一的挂起点，通过通道 `recv_timeout` 把异步确认桥接成带超时的
//! 阻塞调用。[`PublishSession::publish`] 不等待远端确认，本地交接
//! 成功即返回。已入队的消息无法撤回，只有 disconnect 能阻止后续
//! 发布。

use crate::broker::{Broker, ConnectAck, TransportError};
use crate::config::{BrokerConfig, QoS};
use cup_protocol::DeviceCommand;
use crossbeam_channel::RecvTimeoutError;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// 初始状态，尚未连接
    #[default]
    Idle,
    /// 已发起连接，等待确认
    Connecting,
    /// 连接确认已到，可以发布
    Connected,
    /// 已断开（主动或生命周期结束）
    Disconnected,
    /// 连接超时或被拒后的终止状态
    Failed,
}

/// 连接错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// 超时窗口内未收到连接确认
    #[error("connect acknowledgement timed out")]
    Timeout,

    /// Broker 拒绝连接
    #[error("broker rejected connection (code {code})")]
    Rejected { code: u8 },

    /// 当前状态不允许发起连接
    #[error("connect not allowed in state {0:?}")]
    InvalidState(SessionState),

    /// 传输层错误
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// 发布错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// 只有 Connected 状态允许发布
    #[error("not connected (state {0:?})")]
    NotConnected(SessionState),

    /// 传输层拒绝本地交接
    #[error("transport rejected publish: {0}")]
    TransportRejected(#[from] TransportError),
}

/// 从设备身份推导路由主题
///
/// 纯函数，仅依赖 `device_token`。
pub fn command_topic(device_token: &str) -> String {
    format!("device/command/{device_token}")
}

/// 发布会话
///
/// 生命周期内独占持有底层连接资源：经 `connect` 获取，经
/// `disconnect`（含 Drop 与失败路径）保证释放。
pub struct PublishSession<B: Broker> {
    broker: B,
    state: SessionState,
}

impl<B: Broker> PublishSession<B> {
    pub fn new(broker: B) -> Self {
        Self {
            broker,
            state: SessionState::Idle,
        }
    }

    /// 当前会话状态
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 连接 Broker 并阻塞等待确认
    ///
    /// `Idle → Connecting`，随后挂起调用方直到连接确认到达或
    /// `config.connect_timeout`（默认 5 秒）耗尽：
    /// - 确认接受：转入 `Connected`，返回成功
    /// - 确认拒绝：转入 `Failed`，返回 [`ConnectError::Rejected`]
    /// - 超时：转入 `Failed` 并释放传输资源，返回
    ///   [`ConnectError::Timeout`]
    ///
    /// 断开后的实例允许重新 connect；其余状态拒绝。
    pub fn connect(&mut self, config: &BrokerConfig) -> Result<(), ConnectError> {
        match self.state {
            SessionState::Idle | SessionState::Disconnected => {}
            state => return Err(ConnectError::InvalidState(state)),
        }

        info!(host = %config.host, port = config.port, tls = config.use_tls, "connecting to broker");
        self.state = SessionState::Connecting;

        let ack_rx = match self.broker.connect(config) {
            Ok(rx) => rx,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(ConnectError::Transport(e));
            }
        };

        // 唯一的挂起点：把异步确认桥接成带超时的阻塞等待
        match ack_rx.recv_timeout(config.connect_timeout) {
            Ok(ConnectAck::Accepted) => {
                self.state = SessionState::Connected;
                info!("connected to broker");
                Ok(())
            }
            Ok(ConnectAck::Rejected(code)) => {
                self.state = SessionState::Failed;
                warn!(code, "broker rejected connection");
                Err(ConnectError::Rejected { code })
            }
            Err(RecvTimeoutError::Timeout) => {
                // 失败路径同样释放连接资源
                self.state = SessionState::Failed;
                self.broker.disconnect();
                warn!(timeout_ms = config.connect_timeout.as_millis() as u64, "connect acknowledgement timed out");
                Err(ConnectError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.state = SessionState::Failed;
                self.broker.disconnect();
                Err(ConnectError::Transport(TransportError::ChannelClosed))
            }
        }
    }

    /// 将字节发布到路由主题
    ///
    /// 仅在 `Connected` 状态合法。投递保证（按 `qos` 重试直到确认、
    /// 至少一次/恰好一次）完全委托 Broker，本方法不重试。成功返回
    /// 表示消息已入队，不等于设备已处理——日志与返回值都不混淆
    /// "queued" 与 "delivered"。
    pub fn publish(
        &mut self,
        routing_key: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), PublishError> {
        if self.state != SessionState::Connected {
            return Err(PublishError::NotConnected(self.state));
        }
        self.broker.publish(routing_key, payload, qos)?;
        debug!(topic = %routing_key, len = payload.len(), ?qos, "command queued for delivery");
        Ok(())
    }

    /// 编码信封并发布到按设备身份推导的主题
    pub fn publish_command(
        &mut self,
        command: &DeviceCommand,
        qos: QoS,
    ) -> Result<(), PublishError> {
        let topic = command_topic(&command.device_token);
        self.publish(&topic, &command.encode(), qos)
    }

    /// 断开连接
    ///
    /// 幂等：任何状态（包括 `Failed`）都转入 `Disconnected`，
    /// 重复调用安全。
    pub fn disconnect(&mut self) {
        if matches!(
            self.state,
            SessionState::Connecting | SessionState::Connected
        ) {
            self.broker.disconnect();
            info!("disconnected from broker");
        }
        self.state = SessionState::Disconnected;
    }
}

impl<B: Broker> Drop for PublishSession<B> {
    fn drop(&mut self) {
        // 每条退出路径都释放连接资源
        self.disconnect();
    }
}

/// 当前 Unix 毫秒时间戳（信封 `timestamp` 字段的生产方赋值工具）
pub fn unix_time_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        // 时钟早于 epoch 的宿主：按负毫秒数表示
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{AckMode, MockBroker};
    use std::time::{Duration, Instant};

    fn fast_config() -> BrokerConfig {
        BrokerConfig {
            connect_timeout: Duration::from_millis(200),
            ..BrokerConfig::default()
        }
    }

    #[test]
    fn test_publish_before_connect_not_connected() {
        let broker = MockBroker::new(AckMode::Accept);
        let log = broker.published();
        let mut session = PublishSession::new(broker);

        let result = session.publish("device/command/hw2020515", b"bytes", QoS::AtLeastOnce);
        assert_eq!(
            result,
            Err(PublishError::NotConnected(SessionState::Idle))
        );
        // 消息从未到达 Broker
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_connect_accepted_then_publish() {
        let broker = MockBroker::new(AckMode::Accept);
        let log = broker.published();
        let mut session = PublishSession::new(broker);

        session.connect(&fast_config()).unwrap();
        assert_eq!(session.state(), SessionState::Connected);

        session
            .publish("device/command/hw2020515", &[1, 2, 3], QoS::AtLeastOnce)
            .unwrap();
        let published = log.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "device/command/hw2020515");
        assert_eq!(published[0].qos, QoS::AtLeastOnce);
    }

    #[test]
    fn test_connect_timeout_within_window() {
        // Silent broker 永不回确认
        let mut session = PublishSession::new(MockBroker::new(AckMode::Silent));
        let started = Instant::now();
        let result = session.connect(&fast_config());
        let elapsed = started.elapsed();

        assert_eq!(result, Err(ConnectError::Timeout));
        assert_eq!(session.state(), SessionState::Failed);
        // 在超时窗口附近返回，绝不无限挂起
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn test_connect_rejected_code_surfaced() {
        let mut session = PublishSession::new(MockBroker::new(AckMode::Reject(5)));
        assert_eq!(
            session.connect(&fast_config()),
            Err(ConnectError::Rejected { code: 5 })
        );
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_publish_after_failed_not_connected() {
        let mut session = PublishSession::new(MockBroker::new(AckMode::Reject(4)));
        let _ = session.connect(&fast_config());
        assert_eq!(
            session.publish("device/command/t", b"x", QoS::AtMostOnce),
            Err(PublishError::NotConnected(SessionState::Failed))
        );
    }

    #[test]
    fn test_disconnect_idempotent_from_any_state() {
        // 从 Failed 状态断开
        let mut session = PublishSession::new(MockBroker::new(AckMode::Silent));
        let _ = session.connect(&fast_config());
        session.disconnect();
        assert_eq!(session.state(), SessionState::Disconnected);
        session.disconnect();
        assert_eq!(session.state(), SessionState::Disconnected);

        // 从 Idle 状态断开
        let mut idle = PublishSession::new(MockBroker::new(AckMode::Accept));
        idle.disconnect();
        assert_eq!(idle.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_connect_invalid_from_connected() {
        let mut session = PublishSession::new(MockBroker::new(AckMode::Accept));
        session.connect(&fast_config()).unwrap();
        assert_eq!(
            session.connect(&fast_config()),
            Err(ConnectError::InvalidState(SessionState::Connected))
        );
    }

    #[test]
    fn test_reconnect_after_disconnect() {
        let mut session = PublishSession::new(MockBroker::new(AckMode::Accept));
        session.connect(&fast_config()).unwrap();
        session.disconnect();
        session.connect(&fast_config()).unwrap();
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn test_command_topic_derivation() {
        assert_eq!(command_topic("hw2020515"), "device/command/hw2020515");
    }
}
