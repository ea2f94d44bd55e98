//! 阶段状态机
//!
//! 纯逻辑，不涉及时钟和音频：每次开始或计时器到期时，
//! 根据当前配置计算下一步要做什么（播放哪个提示音、以什么速率、
//! 等待多久），由上层负责真正的调度
//!
//! # 状态流转（extended）
//!
//! ```text
//! idle ──start──> normal (index 0 .. 2×breaths，每个半周期一次计时)
//!                   │ index ≥ 2×breaths（立即）
//!                   v
//!                retention (3000ms)
//!                   v
//!                recovery-in (吸气提示音，原速)
//!                   v
//!                recovery-out (呼气提示音，原速)
//!                   v
//!                rest (5000ms) ──round+1──> normal
//!
//! 任何决策点上 round > rounds ──> idle
//! ```

use std::time::Duration;

use serde::Serialize;

use crate::audio::CueKind;
use crate::state::{BreathSettings, Phase, PhaseSet, RunState};

/// 屏息阶段时长（毫秒）
pub const RETENTION_MS: u64 = 3000;

/// 休息阶段时长（毫秒）
pub const REST_MS: u64 = 5000;

/// 一次提示音播放
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CuePlayback {
    pub cue: CueKind,
    pub rate: f64,
}

/// 一个需要计时的阶段步
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTick {
    /// 进入该步时的运行状态
    pub state: RunState,
    /// 需要播放的提示音
    pub cue: Option<CuePlayback>,
    /// 到期前等待的时长
    pub delay: Duration,
}

/// 状态机每次决策的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// 播放（可选）并启动计时器
    Tick(PhaseTick),
    /// 所有轮次完成，回到空闲
    Finished,
    /// 未在练习，无事可做
    Idle,
}

impl Step {
    pub fn tick(&self) -> Option<&PhaseTick> {
        match self {
            Step::Tick(tick) => Some(tick),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Step::Finished)
    }
}

/// 阶段状态机
#[derive(Debug, Clone)]
pub struct PhaseSequencer {
    state: RunState,
    /// 开始时锁定的阶段集合
    phase_set: PhaseSet,
}

impl PhaseSequencer {
    pub fn new() -> Self {
        Self {
            state: RunState::idle(),
            phase_set: PhaseSet::default(),
        }
    }

    /// 当前运行状态
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// 本次练习使用的阶段集合
    pub fn phase_set(&self) -> PhaseSet {
        self.phase_set
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// 开始（或重新开始）练习
    ///
    /// 无论当前状态如何，都重置到第 1 轮、第 0 个半周期
    pub fn start(&mut self, settings: &BreathSettings) -> Step {
        self.phase_set = settings.phase_set;
        self.state = RunState::started();
        self.evaluate(settings)
    }

    /// 停止练习，回到空闲
    pub fn stop(&mut self) {
        self.state = RunState::idle();
    }

    /// 计时器到期
    ///
    /// 应用当前阶段的到期效果，然后回到决策点
    pub fn on_timer_expired(&mut self, settings: &BreathSettings) -> Step {
        if !self.state.is_playing {
            return Step::Idle;
        }

        match self.state.phase {
            Phase::Normal => {
                self.state.current_breath_index += 1;
            }
            Phase::Retention => {
                self.state.phase = Phase::RecoveryIn;
            }
            Phase::RecoveryIn => {
                self.state.phase = Phase::RecoveryOut;
            }
            Phase::RecoveryOut => {
                let final_round = self.state.current_round >= self.effective_rounds(settings);
                if final_round && !settings.rest_after_final_round {
                    self.stop();
                    return Step::Finished;
                }
                self.state.phase = Phase::Rest;
            }
            Phase::Rest => {
                self.advance_round();
            }
        }

        self.evaluate(settings)
    }

    /// 决策点
    ///
    /// 配置在每次决策时重新读取；不需要计时的转换（一轮呼吸结束）
    /// 在这里立即完成
    fn evaluate(&mut self, settings: &BreathSettings) -> Step {
        loop {
            if !self.state.is_playing {
                return Step::Idle;
            }

            if self.state.current_round > self.effective_rounds(settings) {
                self.stop();
                return Step::Finished;
            }

            let (cue, delay) = match self.state.phase {
                Phase::Normal => {
                    if self.state.current_breath_index >= settings.cycles_per_round() {
                        self.complete_breathing();
                        continue;
                    }
                    let cue = breath_cue(self.state.current_breath_index);
                    let target_ms = settings.target_cycle_ms();
                    (
                        Some(CuePlayback {
                            cue,
                            rate: cue.rate_for(target_ms),
                        }),
                        Duration::from_millis(target_ms),
                    )
                }
                Phase::Retention => (None, Duration::from_millis(RETENTION_MS)),
                Phase::RecoveryIn => (
                    Some(CuePlayback {
                        cue: CueKind::BreathIn,
                        rate: 1.0,
                    }),
                    CueKind::BreathIn.native_duration(),
                ),
                Phase::RecoveryOut => (
                    Some(CuePlayback {
                        cue: CueKind::BreathOut,
                        rate: 1.0,
                    }),
                    CueKind::BreathOut.native_duration(),
                ),
                Phase::Rest => (None, Duration::from_millis(REST_MS)),
            };

            return Step::Tick(PhaseTick {
                state: self.state.clone(),
                cue,
                delay,
            });
        }
    }

    /// 一轮呼吸完成后的立即转换
    fn complete_breathing(&mut self) {
        match self.phase_set {
            PhaseSet::Extended => {
                self.state.phase = Phase::Retention;
            }
            PhaseSet::Rounds | PhaseSet::Minimal | PhaseSet::BreathOnly => {
                self.advance_round();
            }
        }
    }

    fn advance_round(&mut self) {
        self.state.current_round += 1;
        self.state.current_breath_index = 0;
        self.state.phase = Phase::Normal;
    }

    fn effective_rounds(&self, settings: &BreathSettings) -> u32 {
        self.phase_set.effective_rounds(settings.round_count)
    }
}

impl Default for PhaseSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// 偶数索引吸气，奇数索引呼气
pub fn breath_cue(breath_index: u32) -> CueKind {
    if breath_index % 2 == 0 {
        CueKind::BreathIn
    } else {
        CueKind::BreathOut
    }
}

/// 不经过计时器，直接推演完整的一次练习
///
/// 配置在整个过程中保持不变
pub fn plan_run(settings: &BreathSettings) -> Vec<PhaseTick> {
    let mut sequencer = PhaseSequencer::new();
    let mut ticks = Vec::new();
    let mut step = sequencer.start(settings);

    while let Step::Tick(tick) = step {
        ticks.push(tick);
        step = sequencer.on_timer_expired(settings);
    }

    ticks
}

/// 一次练习的总时长
pub fn planned_duration(settings: &BreathSettings) -> Duration {
    plan_run(settings).iter().map(|tick| tick.delay).sum()
}
