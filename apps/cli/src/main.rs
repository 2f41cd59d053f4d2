//! # Loco CLI
//!
//! 四足机器人移动控制器的命令行工具。
//!
//! ```bash
//! # 校验配置文件
//! loco-cli check-config --config loco.toml
//!
//! # 用演示协作者跑融合循环（Ctrl-C 停机）
//! loco-cli run --config loco.toml
//!
//! # 限时运行 5 秒（CI / 冒烟测试）
//! loco-cli run --duration 5
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use loco_control::{ControllerConfig, FusionCycle, Policy, run_fusion_loop};
use loco_driver::LocoDriverBuilder;

mod demo;

use demo::{DemoIk, DemoTrajectory, ZeroPolicy, reference_stance, spawn_demo_feeder};

/// Loco CLI - 四足移动控制器命令行工具
#[derive(Parser, Debug)]
#[command(name = "loco-cli")]
#[command(about = "Command-line interface for the quadruped locomotion controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 用演示协作者运行融合循环
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 加载并校验配置文件
    CheckConfig {
        #[command(flatten)]
        args: CheckConfigArgs,
    },
}

/// run 命令参数
#[derive(Args, Debug)]
struct RunArgs {
    /// 配置文件路径（TOML；缺省使用内置默认值）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 运行时长（秒；缺省运行到 Ctrl-C）
    #[arg(short, long)]
    duration: Option<f64>,

    /// 覆盖配置中的控制频率（Hz）
    #[arg(long)]
    rate_hz: Option<f64>,

    /// 启用残差策略（覆盖配置；演示用零残差策略）
    #[arg(long)]
    agent: bool,
}

/// check-config 命令参数
#[derive(Args, Debug)]
struct CheckConfigArgs {
    /// 配置文件路径（TOML）
    #[arg(short, long)]
    config: PathBuf,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("loco_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => run(args),
        Commands::CheckConfig { args } => check_config(args),
    }
}

/// 加载配置：缺省内置默认值，文件字段可部分覆盖（校验由调用方执行）
fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        },
        None => Ok(ControllerConfig::default()),
    }
}

fn run(args: RunArgs) -> Result<()> {
    // 优先级：命令行参数 > 配置文件 > 内置默认值
    let mut config = load_config(args.config.as_deref())?;
    if let Some(rate_hz) = args.rate_hz {
        config.rate_hz = rate_hz;
    }
    if args.agent {
        config.agent_enabled = true;
    }
    config.validate().context("Invalid controller configuration")?;

    let (driver, senders) = LocoDriverBuilder::new().build()?;
    let running = driver.running_flag();

    // Ctrl-C 置停机标志，循环在下一个 tick 边界退出
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("Ctrl-C received, shutting down");
            running.store(false, Ordering::Relaxed);
        })?;
    }

    let feeder = spawn_demo_feeder(senders, Arc::clone(&running))
        .context("Failed to spawn demo feeder thread")?;

    let policy = config
        .agent_enabled
        .then(|| Box::new(ZeroPolicy) as Box<dyn Policy>);
    let mut cycle = FusionCycle::new(
        config.clone(),
        Box::new(DemoTrajectory::new()),
        Box::new(DemoIk),
        policy,
        reference_stance(),
    )?;

    let max_ticks = args.duration.map(|d| (d * config.rate_hz).ceil() as u64);

    println!("🚀 融合循环启动: {} Hz", config.rate_hz);
    if config.agent_enabled {
        println!("   agent: 启用（零残差演示策略）");
    }

    let stats = run_fusion_loop(&mut cycle, &driver.observer(), &driver, running, max_ticks)?;

    driver.shutdown();
    if feeder.join().is_err() {
        tracing::warn!("Demo feeder thread panicked");
    }

    let metrics = driver.metrics();
    println!();
    println!("📊 运行统计:");
    println!("  ticks: {} (跳过 {}, 超时 {})", stats.ticks, stats.skipped, stats.overruns);
    println!("  关节角发布: {}", metrics.joint_sets_published);
    println!("  输入拒绝: {}", metrics.ingest_rejected);
    println!("  非有限动作拒绝: {}", cycle.rejected_actions());
    Ok(())
}

fn check_config(args: CheckConfigArgs) -> Result<()> {
    let config = load_config(Some(&args.config))?;
    config.validate().context("Invalid controller configuration")?;

    println!("✅ 配置有效: {}", args.config.display());
    println!("  控制频率: {} Hz", config.rate_hz);
    println!("  agent: {}", if config.agent_enabled { "启用" } else { "关闭" });
    println!("  观测维度: {}", config.observation_dim());
    println!("  动作滤波: 前 {} 项, α = {}", config.actions_to_filter, config.filter_alpha);
    println!(
        "  抬脚高度: 基准 {} m, 区间 [{}, {}]",
        config.gait.base_clearance_height,
        config.gait.clearance_limits[0],
        config.gait.clearance_limits[1]
    );
    println!(
        "  触地深度: 基准 {} m, 区间 [{}, {}]",
        config.gait.base_penetration_depth,
        config.gait.penetration_limits[0],
        config.gait.penetration_limits[1]
    );
    println!("  IMU 陈旧超时: {} s", config.imu_staleness_timeout_s);
    Ok(())
}
