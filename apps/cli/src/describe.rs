//! 指令内容的人类可读展示
//!
//! 解码并打印信封与内层负载的业务含义，用于发送前检查与 dry-run。

use cup_protocol::{DeviceCommand, Direction, MotionPayload, RotationDirection};

/// 打印信封与（按约定解码的）内层负载
pub fn print_command(command: &DeviceCommand) {
    println!("{}", "=".repeat(60));
    println!("DeviceCommand");
    println!("{}", "=".repeat(60));
    println!("device_token: {}", command.device_token);
    println!("command_type: {:?}", command.command_type);
    println!("timestamp:    {} ms", command.timestamp);
    println!("command_data: {} bytes", command.command_data.len());

    match MotionPayload::decode(&command.command_data) {
        Ok(payload) => print_payload(&payload),
        Err(e) => println!("  (command_data is not a motion payload: {e})"),
    }
}

fn print_payload(payload: &MotionPayload) {
    match payload {
        MotionPayload::None => println!("payload: (none)"),
        MotionPayload::Config(config) => {
            println!("payload: Config ({} primitives)", config.primitives.len());
            for primitive in &config.primitives {
                println!(
                    "  primitive {:?} ({} movements)",
                    primitive.primitive_id,
                    primitive.movements.len()
                );
                for (i, m) in primitive.movements.iter().enumerate() {
                    let dir = match m.direction {
                        Direction::Down => "DOWN",
                        Direction::Up => "UP",
                    };
                    let rot = match m.rotation_direction {
                        RotationDirection::Clockwise => "CW",
                        RotationDirection::CounterClockwise => "CCW",
                    };
                    println!(
                        "    [{i}] {dir} distance={} duration={}s rotation={} {rot}",
                        m.distance, m.duration, m.rotation
                    );
                }
            }
        }
        MotionPayload::Session(session) => {
            println!("payload: Session ({} units)", session.units.len());
            for (i, unit) in session.units.iter().enumerate() {
                println!(
                    "  [{i}] {:?} iteration={} intensity={}",
                    unit.primitive_id, unit.iteration, unit.intensity
                );
            }
        }
        MotionPayload::Control(control) => {
            println!("payload: Control {:?}", control.command);
            if let Some(intensity) = control.intensity {
                println!("  intensity: {intensity}");
            }
            if let Some(duration) = control.duration {
                println!("  duration:  {duration}s");
            }
        }
    }
}

/// 打印编码后的线字节（hex dump）
pub fn print_wire_bytes(bytes: &[u8]) {
    println!("wire bytes ({} bytes): {}", bytes.len(), hex::encode(bytes));
}
