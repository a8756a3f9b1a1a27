//! 底层线格式原语
//!
//! tagged-field 二进制编码的读写工具：varint (LEB128)、fixed64
//! （IEEE-754 double，小端）、length-delimited 字段，以及按线类型
//! 跳过未知字段的工具。
//!
//! 解码端统一在 `&mut &[u8]` 游标上工作（零拷贝），编码端写入
//! [`bytes::BytesMut`]。

use crate::DecodeError;
use bytes::{BufMut, BytesMut};

/// 线类型：varint
pub(crate) const WIRE_VARINT: u8 = 0;
/// 线类型：8 字节小端（double / fixed64）
pub(crate) const WIRE_FIXED64: u8 = 1;
/// 线类型：length-delimited（字符串 / 字节串 / 子消息）
pub(crate) const WIRE_LEN: u8 = 2;
/// 线类型：4 字节小端（本协议不产生，仅用于跳过）
pub(crate) const WIRE_FIXED32: u8 = 5;

// ============================================================================
// varint
// ============================================================================

/// 写入 LEB128 varint
pub(crate) fn put_varint(buf: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// 读取 LEB128 varint（最多 10 字节）
pub(crate) fn get_varint(buf: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let Some((&byte, rest)) = buf.split_first() else {
            return Err(DecodeError::Malformed("truncated varint"));
        };
        *buf = rest;
        if shift >= 64 {
            return Err(DecodeError::Malformed("varint overflow"));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

// ============================================================================
// 字段标签
// ============================================================================

/// 写入字段标签 `(field_number << 3) | wire_type`
pub(crate) fn put_key(buf: &mut BytesMut, field: u32, wire: u8) {
    put_varint(buf, (u64::from(field) << 3) | u64::from(wire));
}

/// 读取字段标签，返回 `(field_number, wire_type)`
///
/// 字段号 0 在线格式中非法。
pub(crate) fn get_key(buf: &mut &[u8]) -> Result<(u32, u8), DecodeError> {
    let key = get_varint(buf)?;
    let field = (key >> 3) as u32;
    if field == 0 {
        return Err(DecodeError::Malformed("field number zero"));
    }
    Ok((field, (key & 0x07) as u8))
}

/// 校验已知字段的线类型
pub(crate) fn expect_wire(actual: u8, expected: u8) -> Result<(), DecodeError> {
    if actual == expected {
        Ok(())
    } else {
        Err(DecodeError::Malformed("unexpected wire type"))
    }
}

// ============================================================================
// 标量字段
// ============================================================================

/// 写入 double 字段（标签 + fixed64 小端）
pub(crate) fn put_double_field(buf: &mut BytesMut, field: u32, value: f64) {
    put_key(buf, field, WIRE_FIXED64);
    buf.put_f64_le(value);
}

/// 读取 fixed64 double
pub(crate) fn get_double(buf: &mut &[u8]) -> Result<f64, DecodeError> {
    let bytes = take(buf, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Ok(f64::from_le_bytes(raw))
}

/// 写入 varint 字段（标签 + 值）
pub(crate) fn put_varint_field(buf: &mut BytesMut, field: u32, value: u64) {
    put_key(buf, field, WIRE_VARINT);
    put_varint(buf, value);
}

// ============================================================================
// length-delimited 字段
// ============================================================================

/// 写入 length-delimited 字段（标签 + 长度 + 数据）
pub(crate) fn put_len_field(buf: &mut BytesMut, field: u32, data: &[u8]) {
    put_key(buf, field, WIRE_LEN);
    put_varint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

/// 读取 length-delimited 数据（长度前缀 + 数据切片）
pub(crate) fn get_len_prefixed<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    let len = get_varint(buf)?;
    if len > buf.len() as u64 {
        return Err(DecodeError::Malformed("length overrun"));
    }
    let (head, rest) = buf.split_at(len as usize);
    *buf = rest;
    Ok(head)
}

/// 读取 UTF-8 字符串字段
pub(crate) fn get_string(buf: &mut &[u8]) -> Result<String, DecodeError> {
    let data = get_len_prefixed(buf)?;
    String::from_utf8(data.to_vec())
        .map_err(|_| DecodeError::Malformed("invalid utf-8 in string field"))
}

// ============================================================================
// 未知字段与枚举
// ============================================================================

/// 取出定长字节
fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8], DecodeError> {
    if buf.len() < n {
        return Err(DecodeError::Malformed("truncated field"));
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

/// 按线类型跳过一个未知字段
///
/// group 线类型（3/4）已废弃且本协议不产生，视为结构损坏。
pub(crate) fn skip_field(buf: &mut &[u8], wire: u8) -> Result<(), DecodeError> {
    match wire {
        WIRE_VARINT => {
            get_varint(buf)?;
        }
        WIRE_FIXED64 => {
            take(buf, 8)?;
        }
        WIRE_LEN => {
            get_len_prefixed(buf)?;
        }
        WIRE_FIXED32 => {
            take(buf, 4)?;
        }
        _ => return Err(DecodeError::Malformed("unsupported wire type")),
    }
    Ok(())
}

/// 从 varint 值解码闭合枚举
///
/// 超出取值范围的判别值视为非法标签。
pub(crate) fn decode_enum<T>(value: u64) -> Result<T, DecodeError>
where
    T: num_enum::TryFromPrimitive<Primitive = u8>,
{
    u8::try_from(value)
        .ok()
        .and_then(|v| T::try_from_primitive(v).ok())
        .ok_or(DecodeError::Malformed("invalid enum value"))
}
