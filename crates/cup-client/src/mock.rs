//! Mock Broker（无传输依赖）
//!
//! 行为可配置的测试桩：接受/拒绝/静默三种确认模式、可选确认延迟、
//! 记录所有已入队的消息供断言。也用作回环演示后端。

use crate::broker::{Broker, ConnectAck, TransportError};
use crate::config::{BrokerConfig, QoS};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 连接确认模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// 接受连接
    Accept,
    /// 以指定返回码拒绝连接
    Reject(u8),
    /// 永不回确认（用于超时路径）
    Silent,
}

/// 已入队消息的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
}

/// 行为可配置的 Mock Broker
pub struct MockBroker {
    ack_mode: AckMode,
    ack_delay: Duration,
    connected: bool,
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    // Silent 模式下保持发送端存活，等待方才会超时而不是看到通道关闭
    pending_ack: Option<Sender<ConnectAck>>,
}

impl MockBroker {
    pub fn new(ack_mode: AckMode) -> Self {
        Self {
            ack_mode,
            ack_delay: Duration::ZERO,
            connected: false,
            published: Arc::new(Mutex::new(Vec::new())),
            pending_ack: None,
        }
    }

    /// 确认送达前的延迟（默认无延迟）
    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    /// 已入队消息记录的共享句柄（在 Broker 移交给会话前克隆持有）
    pub fn published(&self) -> Arc<Mutex<Vec<PublishedMessage>>> {
        Arc::clone(&self.published)
    }
}

impl Broker for MockBroker {
    fn connect(&mut self, _config: &BrokerConfig) -> Result<Receiver<ConnectAck>, TransportError> {
        let (tx, rx) = bounded(1);
        match self.ack_mode {
            AckMode::Accept => {
                self.connected = true;
                deliver(tx, ConnectAck::Accepted, self.ack_delay);
            }
            AckMode::Reject(code) => {
                deliver(tx, ConnectAck::Rejected(code), self.ack_delay);
            }
            AckMode::Silent => {
                self.pending_ack = Some(tx);
            }
        }
        Ok(rx)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Rejected("broker not connected".to_string()));
        }
        self.published
            .lock()
            .expect("published log poisoned")
            .push(PublishedMessage {
                topic: topic.to_string(),
                payload: payload.to_vec(),
                qos,
            });
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.pending_ack = None;
    }
}

fn deliver(tx: Sender<ConnectAck>, ack: ConnectAck, delay: Duration) {
    if delay.is_zero() {
        let _ = tx.send(ack);
    } else {
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let _ = tx.send(ack);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_connect_rejected() {
        let mut broker = MockBroker::new(AckMode::Accept);
        assert!(matches!(
            broker.publish("t", b"x", QoS::AtMostOnce),
            Err(TransportError::Rejected(_))
        ));
    }

    #[test]
    fn test_delayed_ack_arrives() {
        let mut broker = MockBroker::new(AckMode::Accept).with_ack_delay(Duration::from_millis(20));
        let rx = broker.connect(&BrokerConfig::default()).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            ConnectAck::Accepted
        );
    }

    #[test]
    fn test_silent_mode_keeps_channel_open() {
        let mut broker = MockBroker::new(AckMode::Silent);
        let rx = broker.connect(&BrokerConfig::default()).unwrap();
        // 超时而不是通道关闭
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(20)),
            Err(crossbeam_channel::RecvTimeoutError::Timeout)
        ));
    }
}
