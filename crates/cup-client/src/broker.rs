//! Broker 抽象层
//!
//! 发布/订阅传输是一个不透明协作者：它在自己的后台线程里做 I/O 与
//! 事件处理，异步地送达连接/发布确认。本 trait 是协议层与具体传输
//! （MQTT 客户端、回环测试桩等）之间的接缝——
//! [`PublishSession`](crate::PublishSession) 只依赖这里的契约。

use crate::config::{BrokerConfig, QoS};
use crossbeam_channel::Receiver;
use thiserror::Error;

/// 连接确认
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAck {
    /// Broker 接受连接
    Accepted,
    /// Broker 拒绝连接，携带协议返回码
    Rejected(u8),
}

/// 传输层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 本地交接被拒（缓冲满、连接已失效等）
    #[error("transport rejected hand-off: {0}")]
    Rejected(String),

    /// 事件通道关闭（后台线程退出）
    #[error("transport event channel closed")]
    ChannelClosed,
}

/// 不透明的发布/订阅传输协作者
///
/// 实现方负责自己的后台事件循环、按 QoS 执行投递保证（重试直到
/// 确认等），本 crate 不做任何传输层重试。
pub trait Broker {
    /// 发起异步连接
    ///
    /// 立即返回确认接收通道；连接结果（接受/拒绝）由后台投递到
    /// 该通道。等待与超时由调用方负责。
    fn connect(&mut self, config: &BrokerConfig) -> Result<Receiver<ConnectAck>, TransportError>;

    /// 将消息交给传输排队投递
    ///
    /// 成功返回表示消息已被本地接受排队，不代表远端已处理。
    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), TransportError>;

    /// 断开连接（可多次调用）
    fn disconnect(&mut self);
}
