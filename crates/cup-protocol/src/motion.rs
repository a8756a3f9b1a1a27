//! 运动负载（DeviceMotionMessage）类型与编解码
//!
//! 负载是一个闭合 tagged union：Config / Session / Control 三个变体
//! 最多一个激活，零激活是合法的空消息。变体判别依靠字段存在性
//! （oneof 字段标签），与任何数据取值无关：激活的变体子消息即使
//! 内容为空也会被完整写出，因此"存在但取零值"与"缺失"在线上可区分。
//!
//! 未知的 oneof 字段号解码为 [`MotionPayload::None`]，老读者可以
//! 容忍新写者增加变体（向前兼容）。

use crate::DecodeError;
use crate::wire::{
    self, WIRE_FIXED64, WIRE_LEN, WIRE_VARINT, expect_wire, get_key, skip_field,
};
use bytes::{Bytes, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// 枚举
// ============================================================================

/// 行程方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Direction {
    #[default]
    Down = 0,
    Up = 1,
}

/// 旋转方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RotationDirection {
    #[default]
    Clockwise = 0,
    CounterClockwise = 1,
}

/// 控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ControlCommand {
    #[default]
    Unspecified = 0,
    Reset = 1,
    Pause = 2,
    Resume = 3,
    SetIntensity = 4,
}

// ============================================================================
// 数据类型
// ============================================================================

/// 单个原子动作步
///
/// 构造后不可变，由所属 [`Primitive`] 独占持有。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Movement {
    /// 行程方向
    pub direction: Direction,
    /// 行程距离（满行程的比例，期望 0..=1，协议层不强制）
    pub distance: f64,
    /// 持续时间（秒，构造期要求 > 0）
    pub duration: f64,
    /// 旋转量（圈数）
    pub rotation: f64,
    /// 旋转方向
    pub rotation_direction: RotationDirection,
}

/// 命名的动作序列
///
/// `movements` 的顺序即执行顺序。`primitive_id` 在同一个
/// [`ConfigPayload`] 内唯一（构造期保证）。
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Primitive {
    pub primitive_id: String,
    pub movements: Vec<Movement>,
}

/// 配置负载：primitive 定义的有序集合
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigPayload {
    pub primitives: Vec<Primitive>,
}

/// 会话单元：对此前下发的 primitive 的弱引用 + 执行参数
///
/// `primitive_id` 不在本系统内解析，由设备对照已接收的配置解析。
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionUnit {
    pub primitive_id: String,
    /// 重复次数（int64，≥0 为约定）
    pub iteration: i64,
    /// 强度缩放因子（通常 0..=1，协议层不强制）
    pub intensity: f64,
}

/// 会话负载：播放顺序敏感的执行计划
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionPayload {
    pub units: Vec<SessionUnit>,
}

/// 控制负载
///
/// `intensity` / `duration` 的存在性是显式跟踪的：`Some(0.0)` 与
/// `None` 在线上可区分，绝不使用"零值即未设置"的哨兵约定。
/// 两个字段只在 `command == SetIntensity` 时有业务意义。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPayload {
    pub command: ControlCommand,
    pub intensity: Option<f64>,
    /// 生效时长（秒）
    pub duration: Option<f64>,
}

/// 运动负载 tagged union
///
/// 激活的变体标签在编解码往返中保持不变，并且可以不解码变体内容
/// 直接查询（[`MotionPayload::peek_variant`]）。
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionPayload {
    /// 零激活：语义上为空但合法的消息，也是未知变体的降级目标
    #[default]
    None,
    Config(ConfigPayload),
    Session(SessionPayload),
    Control(ControlPayload),
}

/// 负载变体标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVariant {
    None,
    Config,
    Session,
    Control,
}

// ============================================================================
// 字段号（与原始 device.proto 对应）
// ============================================================================

const MOVEMENT_DIRECTION: u32 = 1;
const MOVEMENT_DISTANCE: u32 = 2;
const MOVEMENT_DURATION: u32 = 3;
const MOVEMENT_ROTATION: u32 = 4;
const MOVEMENT_ROTATION_DIRECTION: u32 = 5;

const PRIMITIVE_ID: u32 = 1;
const PRIMITIVE_MOVEMENTS: u32 = 2;

const CONFIG_PRIMITIVES: u32 = 1;

const UNIT_PRIMITIVE_ID: u32 = 1;
const UNIT_ITERATION: u32 = 2;
const UNIT_INTENSITY: u32 = 3;

const SESSION_UNITS: u32 = 1;

const CONTROL_COMMAND: u32 = 1;
const CONTROL_INTENSITY: u32 = 2;
const CONTROL_DURATION: u32 = 3;

/// oneof 判别字段号：1=config, 2=session, 3=control
const ONEOF_CONFIG: u32 = 1;
const ONEOF_SESSION: u32 = 2;
const ONEOF_CONTROL: u32 = 3;

// ============================================================================
// 编解码
// ============================================================================

impl Movement {
    fn encode_into(&self, buf: &mut BytesMut) {
        // 取默认值的标量字段省略（proto3 语义），解码端补默认值
        if self.direction != Direction::default() {
            wire::put_varint_field(buf, MOVEMENT_DIRECTION, u64::from(u8::from(self.direction)));
        }
        if self.distance != 0.0 {
            wire::put_double_field(buf, MOVEMENT_DISTANCE, self.distance);
        }
        if self.duration != 0.0 {
            wire::put_double_field(buf, MOVEMENT_DURATION, self.duration);
        }
        if self.rotation != 0.0 {
            wire::put_double_field(buf, MOVEMENT_ROTATION, self.rotation);
        }
        if self.rotation_direction != RotationDirection::default() {
            wire::put_varint_field(
                buf,
                MOVEMENT_ROTATION_DIRECTION,
                u64::from(u8::from(self.rotation_direction)),
            );
        }
    }

    fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        let mut movement = Movement::default();
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                MOVEMENT_DIRECTION => {
                    expect_wire(wire_type, WIRE_VARINT)?;
                    movement.direction = wire::decode_enum(wire::get_varint(&mut buf)?)?;
                }
                MOVEMENT_DISTANCE => {
                    expect_wire(wire_type, WIRE_FIXED64)?;
                    movement.distance = wire::get_double(&mut buf)?;
                }
                MOVEMENT_DURATION => {
                    expect_wire(wire_type, WIRE_FIXED64)?;
                    movement.duration = wire::get_double(&mut buf)?;
                }
                MOVEMENT_ROTATION => {
                    expect_wire(wire_type, WIRE_FIXED64)?;
                    movement.rotation = wire::get_double(&mut buf)?;
                }
                MOVEMENT_ROTATION_DIRECTION => {
                    expect_wire(wire_type, WIRE_VARINT)?;
                    movement.rotation_direction = wire::decode_enum(wire::get_varint(&mut buf)?)?;
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(movement)
    }
}

impl Primitive {
    fn encode_into(&self, buf: &mut BytesMut) {
        if !self.primitive_id.is_empty() {
            wire::put_len_field(buf, PRIMITIVE_ID, self.primitive_id.as_bytes());
        }
        for movement in &self.movements {
            let mut body = BytesMut::new();
            movement.encode_into(&mut body);
            wire::put_len_field(buf, PRIMITIVE_MOVEMENTS, &body);
        }
    }

    fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        let mut primitive = Primitive::default();
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                PRIMITIVE_ID => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    primitive.primitive_id = wire::get_string(&mut buf)?;
                }
                PRIMITIVE_MOVEMENTS => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    let body = wire::get_len_prefixed(&mut buf)?;
                    primitive.movements.push(Movement::decode(body)?);
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(primitive)
    }
}

impl ConfigPayload {
    fn encode_into(&self, buf: &mut BytesMut) {
        for primitive in &self.primitives {
            let mut body = BytesMut::new();
            primitive.encode_into(&mut body);
            wire::put_len_field(buf, CONFIG_PRIMITIVES, &body);
        }
    }

    fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        let mut config = ConfigPayload::default();
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                CONFIG_PRIMITIVES => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    let body = wire::get_len_prefixed(&mut buf)?;
                    config.primitives.push(Primitive::decode(body)?);
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(config)
    }
}

impl SessionUnit {
    fn encode_into(&self, buf: &mut BytesMut) {
        if !self.primitive_id.is_empty() {
            wire::put_len_field(buf, UNIT_PRIMITIVE_ID, self.primitive_id.as_bytes());
        }
        if self.iteration != 0 {
            wire::put_varint_field(buf, UNIT_ITERATION, self.iteration as u64);
        }
        if self.intensity != 0.0 {
            wire::put_double_field(buf, UNIT_INTENSITY, self.intensity);
        }
    }

    fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        let mut unit = SessionUnit::default();
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                UNIT_PRIMITIVE_ID => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    unit.primitive_id = wire::get_string(&mut buf)?;
                }
                UNIT_ITERATION => {
                    expect_wire(wire_type, WIRE_VARINT)?;
                    unit.iteration = wire::get_varint(&mut buf)? as i64;
                }
                UNIT_INTENSITY => {
                    expect_wire(wire_type, WIRE_FIXED64)?;
                    unit.intensity = wire::get_double(&mut buf)?;
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(unit)
    }
}

impl SessionPayload {
    fn encode_into(&self, buf: &mut BytesMut) {
        for unit in &self.units {
            let mut body = BytesMut::new();
            unit.encode_into(&mut body);
            wire::put_len_field(buf, SESSION_UNITS, &body);
        }
    }

    fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        let mut session = SessionPayload::default();
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                SESSION_UNITS => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    let body = wire::get_len_prefixed(&mut buf)?;
                    session.units.push(SessionUnit::decode(body)?);
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(session)
    }
}

impl ControlPayload {
    fn encode_into(&self, buf: &mut BytesMut) {
        if self.command != ControlCommand::default() {
            wire::put_varint_field(buf, CONTROL_COMMAND, u64::from(u8::from(self.command)));
        }
        // 可选字段按存在性编码：Some(0.0) 也会被写出
        if let Some(intensity) = self.intensity {
            wire::put_double_field(buf, CONTROL_INTENSITY, intensity);
        }
        if let Some(duration) = self.duration {
            wire::put_double_field(buf, CONTROL_DURATION, duration);
        }
    }

    fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        let mut control = ControlPayload::default();
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                CONTROL_COMMAND => {
                    expect_wire(wire_type, WIRE_VARINT)?;
                    control.command = wire::decode_enum(wire::get_varint(&mut buf)?)?;
                }
                CONTROL_INTENSITY => {
                    expect_wire(wire_type, WIRE_FIXED64)?;
                    control.intensity = Some(wire::get_double(&mut buf)?);
                }
                CONTROL_DURATION => {
                    expect_wire(wire_type, WIRE_FIXED64)?;
                    control.duration = Some(wire::get_double(&mut buf)?);
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(control)
    }
}

impl MotionPayload {
    /// 当前激活的变体标签
    pub fn variant(&self) -> PayloadVariant {
        match self {
            MotionPayload::None => PayloadVariant::None,
            MotionPayload::Config(_) => PayloadVariant::Config,
            MotionPayload::Session(_) => PayloadVariant::Session,
            MotionPayload::Control(_) => PayloadVariant::Control,
        }
    }

    /// 编码为线格式字节
    ///
    /// 激活的变体子消息总是被写出（即使为空），作为与数据取值无关的
    /// 判别标记；`MotionPayload::None` 编码为空字节串。
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            MotionPayload::None => {}
            MotionPayload::Config(config) => {
                let mut body = BytesMut::new();
                config.encode_into(&mut body);
                wire::put_len_field(&mut buf, ONEOF_CONFIG, &body);
            }
            MotionPayload::Session(session) => {
                let mut body = BytesMut::new();
                session.encode_into(&mut body);
                wire::put_len_field(&mut buf, ONEOF_SESSION, &body);
            }
            MotionPayload::Control(control) => {
                let mut body = BytesMut::new();
                control.encode_into(&mut body);
                wire::put_len_field(&mut buf, ONEOF_CONTROL, &body);
            }
        }
        buf.freeze()
    }

    /// 从线格式字节解码
    ///
    /// 只在结构损坏时失败。未知的 oneof 字段号被跳过，结果保持
    /// `None`；同一 oneof 字段出现多次时后者覆盖前者（last-wins）。
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = bytes;
        let mut payload = MotionPayload::None;
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                ONEOF_CONFIG => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    let body = wire::get_len_prefixed(&mut buf)?;
                    payload = MotionPayload::Config(ConfigPayload::decode(body)?);
                }
                ONEOF_SESSION => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    let body = wire::get_len_prefixed(&mut buf)?;
                    payload = MotionPayload::Session(SessionPayload::decode(body)?);
                }
                ONEOF_CONTROL => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    let body = wire::get_len_prefixed(&mut buf)?;
                    payload = MotionPayload::Control(ControlPayload::decode(body)?);
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(payload)
    }

    /// 只扫描顶层字段标签、不解码变体内容地查询变体标签
    ///
    /// 与 [`MotionPayload::decode`] 对同一字节串给出一致的标签。
    pub fn peek_variant(bytes: &[u8]) -> Result<PayloadVariant, DecodeError> {
        let mut buf = bytes;
        let mut variant = PayloadVariant::None;
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                ONEOF_CONFIG | ONEOF_SESSION | ONEOF_CONTROL => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    wire::get_len_prefixed(&mut buf)?;
                    variant = match field {
                        ONEOF_CONFIG => PayloadVariant::Config,
                        ONEOF_SESSION => PayloadVariant::Session,
                        _ => PayloadVariant::Control,
                    };
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        Ok(variant)
    }
}
