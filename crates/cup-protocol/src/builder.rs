//! 指令构造器
//!
//! 纯函数、无副作用：从结构化输入组装合法的负载与信封，并在编码前
//! 强制 schema 不变量。构造期校验失败总是上抛，绝不静默修正。
//!
//! 语义层面的跨字段不匹配（例如 SetIntensity 缺参数的宽松解码结果）
//! 不是硬错误：由 [`control_warnings`] 以警告形式报告，编码与发布
//! 照常进行——协议偏向宽松的向前兼容传输而不是线边界上的严格校验。

use crate::command::{CommandType, DeviceCommand};
use crate::motion::{
    ConfigPayload, ControlCommand, ControlPayload, Movement, Primitive, SessionPayload,
    SessionUnit,
};
use bytes::Bytes;
use std::collections::HashSet;
use thiserror::Error;

/// 构造期 schema 校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// primitive_id 为空（或仅空白）
    #[error("primitive_id must not be blank")]
    EmptyId,

    /// 同一配置内 primitive_id 重复
    #[error("duplicate primitive_id: {0:?}")]
    DuplicateId(String),

    /// primitive 不含任何动作
    #[error("primitive {0:?} has no movements")]
    EmptyMovements(String),

    /// 动作持续时间必须为正
    #[error("movement duration must be > 0, got {duration} in primitive {primitive_id:?}")]
    NonPositiveDuration { primitive_id: String, duration: f64 },

    /// SetIntensity 缺少 intensity/duration 参数
    #[error("SET_INTENSITY requires both intensity and duration")]
    MissingIntensityParams,

    /// device_token 为空（或仅空白）
    #[error("device_token must not be blank")]
    EmptyToken,
}

/// 语义校验警告（与硬错误区分，不阻止编码/发布）
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationWarning {
    /// 非 SetIntensity 命令携带了 intensity/duration，设备端会忽略
    #[error("intensity/duration supplied but ignored by {command:?}")]
    SuperfluousIntensityParams { command: ControlCommand },

    /// 解码得到的 SetIntensity 缺少参数（宽松线格式允许）
    #[error("SET_INTENSITY carried without intensity/duration parameters")]
    IncompleteSetIntensity,
}

/// 构造配置负载
///
/// 输入为 `(primitive_id, movements)` 的有序序列，顺序即下发顺序。
///
/// # 错误
///
/// - [`ValidationError::EmptyId`]: id 为空白
/// - [`ValidationError::DuplicateId`]: id 在本配置内重复
/// - [`ValidationError::EmptyMovements`]: primitive 没有动作
/// - [`ValidationError::NonPositiveDuration`]: 动作持续时间非正
pub fn build_config<I, S>(primitives: I) -> Result<ConfigPayload, ValidationError>
where
    I: IntoIterator<Item = (S, Vec<Movement>)>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (id, movements) in primitives {
        let primitive_id: String = id.into();
        if primitive_id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !seen.insert(primitive_id.clone()) {
            return Err(ValidationError::DuplicateId(primitive_id));
        }
        if movements.is_empty() {
            return Err(ValidationError::EmptyMovements(primitive_id));
        }
        if let Some(movement) = movements.iter().find(|m| m.duration <= 0.0) {
            return Err(ValidationError::NonPositiveDuration {
                primitive_id,
                duration: movement.duration,
            });
        }
        out.push(Primitive {
            primitive_id,
            movements,
        });
    }
    Ok(ConfigPayload { primitives: out })
}

/// 构造会话负载
///
/// 输入为 `(primitive_id, iteration, intensity)` 的有序序列，顺序即
/// 播放顺序。不对照任何已构造的配置做交叉校验——引用由设备端解析，
/// 不在本系统范围内。空序列合法（空操作会话）。
pub fn build_session<I, S>(units: I) -> SessionPayload
where
    I: IntoIterator<Item = (S, i64, f64)>,
    S: Into<String>,
{
    SessionPayload {
        units: units
            .into_iter()
            .map(|(primitive_id, iteration, intensity)| SessionUnit {
                primitive_id: primitive_id.into(),
                iteration,
                intensity,
            })
            .collect(),
    }
}

/// 构造控制负载
///
/// # 错误
///
/// - [`ValidationError::MissingIntensityParams`]: `SetIntensity` 且任一
///   可选参数缺失
///
/// 其他命令忽略这两个参数；若调用方仍然提供，负载照常构造（对多余
/// 数据保持宽松），由 [`control_warnings`] 报告警告。
pub fn build_control(
    command: ControlCommand,
    intensity: Option<f64>,
    duration: Option<f64>,
) -> Result<ControlPayload, ValidationError> {
    if command == ControlCommand::SetIntensity && (intensity.is_none() || duration.is_none()) {
        return Err(ValidationError::MissingIntensityParams);
    }
    Ok(ControlPayload {
        command,
        intensity,
        duration,
    })
}

/// 构造指令信封
///
/// # 错误
///
/// - [`ValidationError::EmptyToken`]: device_token 为空白
pub fn build_envelope(
    device_token: impl Into<String>,
    command_type: CommandType,
    payload: impl Into<Bytes>,
    timestamp: i64,
) -> Result<DeviceCommand, ValidationError> {
    let device_token: String = device_token.into();
    if device_token.trim().is_empty() {
        return Err(ValidationError::EmptyToken);
    }
    Ok(DeviceCommand {
        device_token,
        command_type,
        command_data: payload.into(),
        timestamp,
    })
}

/// 控制负载的语义交叉校验
///
/// 返回警告而非错误：不匹配的负载仍然允许编码与发布。
pub fn control_warnings(control: &ControlPayload) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let has_params = control.intensity.is_some() || control.duration.is_some();
    if control.command == ControlCommand::SetIntensity {
        if control.intensity.is_none() || control.duration.is_none() {
            warnings.push(ValidationWarning::IncompleteSetIntensity);
        }
    } else if has_params {
        warnings.push(ValidationWarning::SuperfluousIntensityParams {
            command: control.command,
        });
    }
    warnings
}
