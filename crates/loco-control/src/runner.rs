//! 周期循环运行器
//!
//! 以固定目标频率驱动 [`FusionCycle`]：
//! - **绝对锚点定时**：`next_tick += period`，消除累积漂移，
//!   用 `spin_sleep` 获得亚毫秒级抖动
//! - **超时不追帧**：某个 tick 计算超过标称周期时不补偿、不跳帧，
//!   直接带着实测 dt 进入下一个 tick，步态相位与墙钟保持一致
//! - **失败即跳过**：协作者调用失败只放弃本 tick 的发布并计数，
//!   循环继续
//! - 停机标志在 tick 之间检查，进行中的外部调用不会被打断

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;
use tracing::{info, warn};

use loco_driver::{LocoDriver, Observer};

use crate::cycle::FusionCycle;
use crate::error::ControlError;

/// 一次循环运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    /// 执行的 tick 总数（含跳过的）
    pub ticks: u64,
    /// 因协作者失败放弃发布的 tick 数
    pub skipped: u64,
    /// 计算超过标称周期的 tick 数
    pub overruns: u64,
}

/// 运行融合循环直到停机标志置位（或达到 `max_ticks`）
///
/// 阻塞调用方线程；`max_ticks` 主要用于测试与定时运行。
pub fn run_fusion_loop(
    cycle: &mut FusionCycle,
    observer: &Observer,
    driver: &LocoDriver,
    running: Arc<AtomicBool>,
    max_ticks: Option<u64>,
) -> Result<FusionStats, ControlError> {
    let period = Duration::from_secs_f64(1.0 / cycle.config().rate_hz);
    let sleeper = SpinSleeper::default();

    #[cfg(feature = "realtime")]
    {
        use thread_priority::{ThreadPriority, set_current_thread_priority};
        if let Err(e) = set_current_thread_priority(ThreadPriority::Max) {
            warn!("Failed to elevate control thread priority: {:?}", e);
        }
    }

    info!(
        "Fusion loop starting: {} Hz (period {:?})",
        cycle.config().rate_hz,
        period
    );

    let mut stats = FusionStats::default();
    let mut last = Instant::now();
    let mut next_tick = Instant::now();

    while running.load(Ordering::Relaxed) {
        if let Some(max) = max_ticks
            && stats.ticks >= max
        {
            break;
        }

        // 1. 设定下一个锚点（绝对时间）
        next_tick += period;

        // 实测 dt（单调时钟），原样喂给轨迹发生器
        let now = Instant::now();
        let dt = now - last;
        last = now;

        // 每 tick 读取一次输入快照，整个 tick 使用同一份
        let snapshot = observer.snapshot();
        match cycle.tick(&snapshot, dt) {
            Ok(output) => {
                driver.publish_joints(output.joints);
                if let Some(actions) = output.actions {
                    driver.publish_actions(actions);
                }
            },
            Err(e) => {
                // 本 tick 放弃发布；不重试，过期的重算比错过一帧更危险
                stats.skipped += 1;
                warn!("Tick skipped ({} total): {}", stats.skipped, e);
            },
        }
        stats.ticks += 1;

        // 睡到下一个锚点；超时则不追帧，锚点重置到当前时间
        let now = Instant::now();
        if next_tick > now {
            sleeper.sleep(next_tick - now);
        } else {
            stats.overruns += 1;
            warn!(
                "Control loop overrun: tick took {:?} (period {:?}), proceeding without catch-up",
                now.duration_since(next_tick - period),
                period
            );
            next_tick = now;
        }
    }

    info!(
        "Fusion loop stopped: {} ticks, {} skipped, {} overruns",
        stats.ticks, stats.skipped, stats.overruns
    );
    Ok(stats)
}
