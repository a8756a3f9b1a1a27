//! 内置测试场景数据
//!
//! 与原始测试脚本下发的数据一致：两个 primitive（各 8 个动作）的
//! 波形配置、10 单元交替会话、各控制命令。

use cup_protocol::{
    ConfigPayload, ControlCommand, ControlPayload, Direction, Movement, RotationDirection,
    SessionPayload, ValidationError, build_config, build_control, build_session,
};

fn movement(direction: Direction, distance: f64) -> Movement {
    Movement {
        direction,
        distance,
        duration: 0.3,
        rotation: 1.0,
        rotation_direction: RotationDirection::CounterClockwise,
    }
}

/// 下行 4 步 + 上行 4 步的波形
fn wave(down: [f64; 4], up: [f64; 4]) -> Vec<Movement> {
    down.iter()
        .map(|&d| movement(Direction::Down, d))
        .chain(up.iter().map(|&d| movement(Direction::Up, d)))
        .collect()
}

/// 配置场景：primitive_1 / primitive_2 各 8 个动作
pub fn config_payload() -> Result<ConfigPayload, ValidationError> {
    build_config([
        (
            "primitive_1",
            wave([0.2, 0.3, 0.3, 0.2], [0.2, 0.3, 0.3, 0.2]),
        ),
        (
            "primitive_2",
            wave([0.1, 0.4, 0.3, 0.2], [0.2, 0.3, 0.4, 0.1]),
        ),
    ])
}

/// 会话场景：primitive_1/primitive_2 交替 10 个单元
pub fn session_payload() -> SessionPayload {
    build_session((0..10).map(|i| {
        (
            if i % 2 == 0 { "primitive_1" } else { "primitive_2" },
            15i64,
            1.0,
        )
    }))
}

/// 控制场景
pub fn control_payload(command: ControlCommand) -> Result<ControlPayload, ValidationError> {
    match command {
        // 与原始脚本一致：强度 1.5，持续 10 秒
        ControlCommand::SetIntensity => build_control(command, Some(1.5), Some(10.0)),
        _ => build_control(command, None, None),
    }
}
