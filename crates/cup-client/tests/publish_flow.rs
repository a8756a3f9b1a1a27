//! 端到端发布流程测试
//!
//! 构造配置负载 → 编码 → 装入信封 → 经会话发布 → 在"设备侧"解码
//! 信封与内层负载，校验全链路无损。

use cup_client::mock::{AckMode, MockBroker};
use cup_client::{BrokerConfig, PublishSession, QoS, command_topic};
use cup_protocol::{
    CommandType, DeviceCommand, Direction, MotionPayload, Movement, PayloadVariant,
    RotationDirection, build_config, build_envelope, build_session,
};
use std::time::Duration;

fn wave_movements(distances: [f64; 8]) -> Vec<Movement> {
    distances
        .iter()
        .enumerate()
        .map(|(i, &distance)| Movement {
            direction: if i < 4 { Direction::Down } else { Direction::Up },
            distance,
            duration: 0.3,
            rotation: 1.0,
            rotation_direction: RotationDirection::CounterClockwise,
        })
        .collect()
}

fn test_config() -> BrokerConfig {
    BrokerConfig {
        connect_timeout: Duration::from_millis(500),
        ..BrokerConfig::default()
    }
}

#[test]
fn config_command_survives_publish_roundtrip() {
    // 与原始测试场景一致：2 个 primitive，各 8 个动作
    let config = build_config([
        (
            "primitive_1",
            wave_movements([0.2, 0.3, 0.3, 0.2, 0.2, 0.3, 0.3, 0.2]),
        ),
        (
            "primitive_2",
            wave_movements([0.1, 0.4, 0.3, 0.2, 0.2, 0.3, 0.4, 0.1]),
        ),
    ])
    .unwrap();
    let payload = MotionPayload::Config(config.clone());

    let command = build_envelope(
        "hw2020515",
        CommandType::Task,
        payload.encode(),
        1_766_000_000_000,
    )
    .unwrap();

    // 经会话发布
    let broker = MockBroker::new(AckMode::Accept);
    let log = broker.published();
    let mut session = PublishSession::new(broker);
    session.connect(&test_config()).unwrap();
    session.publish_command(&command, QoS::AtLeastOnce).unwrap();
    session.disconnect();

    // 设备侧：取出线字节，先解信封再解负载
    let published = log.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, command_topic("hw2020515"));
    assert_eq!(published[0].qos, QoS::AtLeastOnce);

    let envelope = DeviceCommand::decode(&published[0].payload).unwrap();
    assert_eq!(envelope.device_token, "hw2020515");
    assert_eq!(envelope.command_type, CommandType::Task);
    assert_eq!(envelope.timestamp, 1_766_000_000_000);

    assert_eq!(
        MotionPayload::peek_variant(&envelope.command_data).unwrap(),
        PayloadVariant::Config
    );
    let MotionPayload::Config(decoded) = MotionPayload::decode(&envelope.command_data).unwrap()
    else {
        panic!("expected config variant");
    };

    // 恰好 2 个 primitive，各 8 个动作，逐字段保持
    assert_eq!(decoded.primitives.len(), 2);
    for (decoded_primitive, original) in decoded.primitives.iter().zip(&config.primitives) {
        assert_eq!(decoded_primitive.primitive_id, original.primitive_id);
        assert_eq!(decoded_primitive.movements.len(), 8);
        assert_eq!(decoded_primitive.movements, original.movements);
    }
}

#[test]
fn session_command_publishes_in_play_order() {
    let session_payload = build_session((0..10).map(|i| {
        (
            if i % 2 == 0 { "primitive_1" } else { "primitive_2" },
            15i64,
            1.0,
        )
    }));
    let payload = MotionPayload::Session(session_payload.clone());
    let command =
        build_envelope("hw2020515", CommandType::Start, payload.encode(), 1).unwrap();

    let broker = MockBroker::new(AckMode::Accept);
    let log = broker.published();
    let mut publisher = PublishSession::new(broker);
    publisher.connect(&test_config()).unwrap();
    publisher.publish_command(&command, QoS::AtLeastOnce).unwrap();

    let published = log.lock().unwrap();
    let envelope = DeviceCommand::decode(&published[0].payload).unwrap();
    assert_eq!(envelope.command_type, CommandType::Start);

    let MotionPayload::Session(decoded) = MotionPayload::decode(&envelope.command_data).unwrap()
    else {
        panic!("expected session variant");
    };
    assert_eq!(decoded.units.len(), 10);
    // 播放顺序保持
    assert_eq!(decoded.units, session_payload.units);
}
