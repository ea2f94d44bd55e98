//! 进度投影
//!
//! 由运行状态和当前配置推导出供界面渲染的只读进度

use std::fmt;

use serde::Serialize;

use super::config::BreathSettings;
use super::run_state::{BreathDirection, Phase, RunState};

/// 轮次进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundProgress {
    pub current: u32,
    pub total: u32,
}

/// 练习进度
///
/// 不持有任何独立状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 轮次（仅在显示轮次的阶段集合中存在）
    pub round: Option<RoundProgress>,
    /// 当前呼吸序号（从 1 开始）
    pub breath_number: u32,
    /// 每轮呼吸总数
    pub breath_total: u32,
    /// 当前呼吸方向
    pub direction: BreathDirection,
    /// 当前阶段
    pub phase: Phase,
    /// 阶段标签
    pub label: &'static str,
}

impl Progress {
    /// 计算当前进度
    ///
    /// 空闲时返回 `None`
    pub fn project(state: &RunState, settings: &BreathSettings) -> Option<Self> {
        if !state.is_playing {
            return None;
        }

        let round = settings.phase_set.shows_rounds().then(|| RoundProgress {
            current: state.current_round,
            total: settings.effective_rounds(),
        });

        Some(Self {
            round,
            breath_number: state.breath_number(),
            breath_total: settings.breath_count,
            direction: state.direction(),
            phase: state.phase,
            label: phase_label(state),
        })
    }
}

/// 阶段标签
pub fn phase_label(state: &RunState) -> &'static str {
    match state.phase {
        Phase::Normal => state.direction().label(),
        Phase::Retention => "Hold",
        Phase::RecoveryIn => "Recovery Breath In",
        Phase::RecoveryOut => "Recovery Breath Out",
        Phase::Rest => "Rest",
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(round) = self.round {
            write!(f, "Round {} of {} | ", round.current, round.total)?;
        }
        if self.phase == Phase::Normal {
            write!(f, "Breath {} of {} | ", self.breath_number, self.breath_total)?;
        }
        f.write_str(self.label)
    }
}
