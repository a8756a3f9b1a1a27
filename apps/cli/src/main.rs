//! # Cup CLI
//!
//! 设备指令场景发送器 / 协议检查器。
//!
//! 构造原始测试脚本中的各个场景（config / session / 控制命令），
//! 打印业务内容与线字节，并经回环 Broker 走一遍完整的
//! connect → publish → disconnect 生命周期。真实传输由集成方
//! 以 `Broker` trait 实现接入。
//!
//! ```bash
//! # 下发配置（dry-run，只打印不发布）
//! cup-cli --dry-run config
//!
//! # 完整流程：配置 + 会话
//! cup-cli --token hw2020515 full
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use cup_client::mock::{AckMode, MockBroker};
use cup_client::{PublishSession, QoS, unix_time_ms};
use cup_protocol::{
    CommandType, ControlCommand, DeviceCommand, MotionPayload, build_envelope, control_warnings,
};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod describe;
mod scenarios;
mod settings;

use settings::Settings;

/// Cup CLI - 设备指令场景发送器
#[derive(Parser, Debug)]
#[command(name = "cup-cli")]
#[command(about = "Scenario sender and protocol inspector for cup device commands", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 覆盖 broker URL（tcp:// / mqtt:// / mqtts://）
    #[arg(short, long)]
    broker: Option<String>,

    /// 覆盖设备 token
    #[arg(long)]
    token: Option<String>,

    /// 只打印指令内容与线字节，不发布
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Subcommand, Debug)]
enum Scenario {
    /// 下发配置（primitive 定义）
    Config,
    /// 下发会话（执行计划）
    Session,
    /// 控制命令 - RESET
    Reset,
    /// 控制命令 - PAUSE
    Pause,
    /// 控制命令 - RESUME
    Resume,
    /// 控制命令 - SET_INTENSITY
    Intensity,
    /// 完整流程（配置 + 会话）
    Full,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.config)?;
    if let Some(broker_url) = cli.broker {
        settings.mqtt.broker_url = broker_url;
    }
    if let Some(token) = cli.token {
        settings.device.token = token;
    }

    let commands = build_scenario(&cli.scenario, &settings.device.token)?;

    for command in &commands {
        describe::print_command(command);
        describe::print_wire_bytes(&command.encode());
    }

    if cli.dry_run {
        return Ok(());
    }

    publish_all(&settings, &commands)
}

/// 组装场景对应的指令序列
fn build_scenario(scenario: &Scenario, token: &str) -> Result<Vec<DeviceCommand>> {
    let commands = match scenario {
        Scenario::Config => vec![task_command(
            token,
            MotionPayload::Config(scenarios::config_payload()?),
            CommandType::Task,
        )?],
        Scenario::Session => vec![task_command(
            token,
            MotionPayload::Session(scenarios::session_payload()),
            CommandType::Start,
        )?],
        Scenario::Reset => vec![control_command(token, ControlCommand::Reset)?],
        Scenario::Pause => vec![control_command(token, ControlCommand::Pause)?],
        Scenario::Resume => vec![control_command(token, ControlCommand::Resume)?],
        Scenario::Intensity => vec![control_command(token, ControlCommand::SetIntensity)?],
        Scenario::Full => vec![
            task_command(
                token,
                MotionPayload::Config(scenarios::config_payload()?),
                CommandType::Task,
            )?,
            task_command(
                token,
                MotionPayload::Session(scenarios::session_payload()),
                CommandType::Start,
            )?,
        ],
    };
    Ok(commands)
}

fn task_command(
    token: &str,
    payload: MotionPayload,
    command_type: CommandType,
) -> Result<DeviceCommand> {
    Ok(build_envelope(
        token,
        command_type,
        payload.encode(),
        unix_time_ms(),
    )?)
}

fn control_command(token: &str, command: ControlCommand) -> Result<DeviceCommand> {
    let control = scenarios::control_payload(command)?;
    // 语义警告不阻止发送，只记录
    for warning in control_warnings(&control) {
        warn!(%warning, "control payload validation warning");
    }
    task_command(token, MotionPayload::Control(control), CommandType::Task)
}

/// 经回环 Broker 发布，走完整 connect → publish → disconnect 生命周期
fn publish_all(settings: &Settings, commands: &[DeviceCommand]) -> Result<()> {
    let broker_config = settings.broker_config()?;
    let qos = settings.qos()?;

    let broker = MockBroker::new(AckMode::Accept);
    let log = broker.published();
    let mut session = PublishSession::new(broker);

    session.connect(&broker_config)?;
    for command in commands {
        session.publish_command(command, qos)?;
    }
    session.disconnect();

    // queued ≠ delivered：这里只报告入队
    let queued = log.lock().expect("published log poisoned");
    for message in queued.iter() {
        println!(
            "✓ queued {} bytes to {} (qos {:?})",
            message.payload.len(),
            message.topic,
            message.qos
        );
    }
    Ok(())
}
