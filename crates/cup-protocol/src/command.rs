//! 指令信封（DeviceCommand）类型与编解码
//!
//! 信封为负载附加路由元数据：设备身份、指令类型、时间戳。
//! `command_data` 对信封编解码器完全不透明——按约定在
//! `command_type == Task` 时是一条编码后的
//! [`MotionPayload`](crate::MotionPayload)，但信封不强制该配对。
//!
//! 信封每次外发指令新建一个，构造后不可变，只在一次 publish 调用
//! 期间存在，不做持久化。

use crate::DecodeError;
use crate::wire::{
    self, WIRE_LEN, WIRE_VARINT, expect_wire, get_key, skip_field,
};
use bytes::{Bytes, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 指令类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandType {
    #[default]
    Unspecified = 0,
    /// 开始运行
    Start = 1,
    /// 停止运行
    Stop = 2,
    /// 详细任务指令（command_data 携带编码后的运动负载）
    Task = 3,
}

/// 指令信封
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceCommand {
    /// 路由/鉴权身份（构造期要求非空）
    pub device_token: String,
    pub command_type: CommandType,
    /// 不透明负载字节
    pub command_data: Bytes,
    /// 生产方赋值的毫秒时间戳（不要求单调，解码不校验范围）
    pub timestamp: i64,
}

const COMMAND_DEVICE_TOKEN: u32 = 1;
const COMMAND_TYPE: u32 = 2;
const COMMAND_DATA: u32 = 3;
const COMMAND_TIMESTAMP: u32 = 4;

impl DeviceCommand {
    /// 编码为线格式字节
    ///
    /// 四个字段在线上都是强制的：即使取默认值（Unspecified、空负载、
    /// 时间戳 0）也总是写出，保证对端解码不缺字段。
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        wire::put_len_field(&mut buf, COMMAND_DEVICE_TOKEN, self.device_token.as_bytes());
        wire::put_varint_field(&mut buf, COMMAND_TYPE, u64::from(u8::from(self.command_type)));
        wire::put_len_field(&mut buf, COMMAND_DATA, &self.command_data);
        wire::put_varint_field(&mut buf, COMMAND_TIMESTAMP, self.timestamp as u64);
        buf.freeze()
    }

    /// 从线格式字节解码
    ///
    /// 任一强制字段缺失视为结构损坏；时间戳按 64 位有符号整数解码，
    /// 越界/负值原样接受。
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = bytes;
        let mut command = DeviceCommand::default();
        let (mut seen_token, mut seen_type, mut seen_data, mut seen_ts) =
            (false, false, false, false);
        while !buf.is_empty() {
            let (field, wire_type) = get_key(&mut buf)?;
            match field {
                COMMAND_DEVICE_TOKEN => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    command.device_token = wire::get_string(&mut buf)?;
                    seen_token = true;
                }
                COMMAND_TYPE => {
                    expect_wire(wire_type, WIRE_VARINT)?;
                    command.command_type = wire::decode_enum(wire::get_varint(&mut buf)?)?;
                    seen_type = true;
                }
                COMMAND_DATA => {
                    expect_wire(wire_type, WIRE_LEN)?;
                    command.command_data =
                        Bytes::copy_from_slice(wire::get_len_prefixed(&mut buf)?);
                    seen_data = true;
                }
                COMMAND_TIMESTAMP => {
                    expect_wire(wire_type, WIRE_VARINT)?;
                    command.timestamp = wire::get_varint(&mut buf)? as i64;
                    seen_ts = true;
                }
                _ => skip_field(&mut buf, wire_type)?,
            }
        }
        if !seen_token {
            return Err(DecodeError::Malformed("missing device_token field"));
        }
        if !seen_type {
            return Err(DecodeError::Malformed("missing command_type field"));
        }
        if !seen_data {
            return Err(DecodeError::Malformed("missing command_data field"));
        }
        if !seen_ts {
            return Err(DecodeError::Malformed("missing timestamp field"));
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn sample_command() -> DeviceCommand {
        DeviceCommand {
            device_token: "hw2020515".to_string(),
            command_type: CommandType::Task,
            command_data: Bytes::from_static(&[0x1A, 0x02, 0x08, 0x01]),
            timestamp: 1_766_000_000_123,
        }
    }

    #[test]
    fn test_envelope_roundtrip() {
        let command = sample_command();
        let decoded = DeviceCommand::decode(&command.encode()).unwrap();
        assert_eq!(decoded, command);
    }

    /// 默认取值的强制字段也总是写出，自编码自解码不缺字段
    #[test]
    fn test_default_values_still_emitted() {
        let command = DeviceCommand {
            device_token: "t".to_string(),
            command_type: CommandType::Unspecified,
            command_data: Bytes::new(),
            timestamp: 0,
        };
        let decoded = DeviceCommand::decode(&command.encode()).unwrap();
        assert_eq!(decoded, command);
    }

    /// 时间戳按 int64 处理，负值原样往返
    #[test]
    fn test_negative_timestamp_accepted() {
        let command = DeviceCommand {
            timestamp: -1,
            ..sample_command()
        };
        let decoded = DeviceCommand::decode(&command.encode()).unwrap();
        assert_eq!(decoded.timestamp, -1);
    }

    /// 负载对信封不透明：任意字节（包括非法的运动负载）原样携带
    #[test]
    fn test_command_data_is_opaque() {
        let command = DeviceCommand {
            command_data: Bytes::from_static(&[0xFF, 0xFF, 0xFF]),
            ..sample_command()
        };
        let decoded = DeviceCommand::decode(&command.encode()).unwrap();
        assert_eq!(&decoded.command_data[..], &[0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_missing_device_token_is_malformed() {
        // 手工构造只含字段 2/3/4 的信封
        let mut buf = BytesMut::new();
        crate::wire::put_varint_field(&mut buf, 2, 3);
        crate::wire::put_len_field(&mut buf, 3, &[]);
        crate::wire::put_varint_field(&mut buf, 4, 123);
        assert_eq!(
            DeviceCommand::decode(&buf),
            Err(DecodeError::Malformed("missing device_token field"))
        );
    }

    #[test]
    fn test_missing_timestamp_is_malformed() {
        let mut buf = BytesMut::new();
        crate::wire::put_len_field(&mut buf, 1, b"hw2020515");
        crate::wire::put_varint_field(&mut buf, 2, 3);
        crate::wire::put_len_field(&mut buf, 3, &[]);
        assert_eq!(
            DeviceCommand::decode(&buf),
            Err(DecodeError::Malformed("missing timestamp field"))
        );
    }

    /// 未知字段被跳过，不影响强制字段解码
    #[test]
    fn test_unknown_field_skipped() {
        let mut buf = BytesMut::from(&sample_command().encode()[..]);
        crate::wire::put_varint_field(&mut buf, 9, 42);
        let decoded = DeviceCommand::decode(&buf).unwrap();
        assert_eq!(decoded, sample_command());
    }

    #[test]
    fn test_truncated_envelope_is_malformed() {
        let encoded = sample_command().encode();
        assert!(matches!(
            DeviceCommand::decode(&encoded[..encoded.len() - 2]),
            Err(DecodeError::Malformed(_))
        ));
    }
}
