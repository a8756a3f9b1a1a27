//! # Cup Protocol
//!
//! 设备指令协议定义（无传输依赖）
//!
//! ## 模块
//!
//! - `wire`: 底层 tagged-field 线格式原语（varint / fixed64 / length-delimited）
//! - `motion`: 运动负载（DeviceMotionMessage）类型与编解码
//! - `command`: 指令信封（DeviceCommand）类型与编解码
//! - `builder`: 纯函数构造器，在编码前强制 schema 不变量
//!
//! ## 嵌套约定
//!
//! `DeviceCommand.command_data` 是不透明字节串，信封编解码器从不解析它。
//! 按约定，当 `command_type == Task` 时其内容是一条编码后的
//! [`MotionPayload`]，由调用方自行二次解码。
//!
//! ## 线格式
//!
//! 与原始 `device.proto` 生成的 protobuf 线格式兼容：字段由
//! `(field_number << 3) | wire_type` 标记，浮点使用 IEEE-754 double
//! （fixed64，小端），未知字段按线类型跳过以保证向前兼容。

pub mod builder;
pub mod command;
pub mod motion;
pub(crate) mod wire;

// 重新导出常用类型
pub use builder::{
    ValidationError, ValidationWarning, build_config, build_control, build_envelope,
    build_session, control_warnings,
};
pub use command::{CommandType, DeviceCommand};
pub use motion::{
    ConfigPayload, ControlCommand, ControlPayload, Direction, MotionPayload, Movement,
    PayloadVariant, Primitive, RotationDirection, SessionPayload, SessionUnit,
};

use thiserror::Error;

/// 协议解码错误类型
///
/// 解码只在字节流结构损坏时失败（截断、非法标签、长度越界）。
/// 语义问题（空 primitive_id 等）不属于解码错误，由 [`builder`]
/// 在构造期负责。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed wire data: {0}")]
    Malformed(&'static str),
}
