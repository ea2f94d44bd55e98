use serde::Serialize;

/// 练习阶段
///
/// 空闲不是一个阶段：`RunState::is_playing` 为 false 时即为空闲，
/// 此时阶段停留在 `Normal`，等待下一次开始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// 正常呼吸，按半周期推进
    Normal,
    /// 屏息
    Retention,
    /// 恢复吸气
    RecoveryIn,
    /// 恢复呼气
    RecoveryOut,
    /// 休息
    Rest,
}

impl Phase {
    /// 获取阶段名称（用于日志和调试）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Retention => "retention",
            Self::RecoveryIn => "recovery-in",
            Self::RecoveryOut => "recovery-out",
            Self::Rest => "rest",
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Normal
    }
}

/// 呼吸方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathDirection {
    Inhale,
    Exhale,
}

impl BreathDirection {
    /// 由半周期索引的奇偶性决定方向
    pub fn from_index(breath_index: u32) -> Self {
        if breath_index % 2 == 0 {
            Self::Inhale
        } else {
            Self::Exhale
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Inhale => "Breathe In",
            Self::Exhale => "Breathe Out",
        }
    }
}

/// 运行状态
///
/// 仅由引擎持有和修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunState {
    /// 是否正在练习
    pub is_playing: bool,
    /// 当前轮次（从 1 开始）
    pub current_round: u32,
    /// 当前半周期索引，每次吸气或呼气加一
    pub current_breath_index: u32,
    /// 当前阶段
    pub phase: Phase,
}

impl RunState {
    /// 创建空闲状态
    pub fn idle() -> Self {
        Self {
            is_playing: false,
            current_round: 1,
            current_breath_index: 0,
            phase: Phase::Normal,
        }
    }

    /// 创建新一次练习的初始状态
    pub fn started() -> Self {
        Self {
            is_playing: true,
            ..Self::idle()
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.is_playing
    }

    /// 当前呼吸方向
    pub fn direction(&self) -> BreathDirection {
        BreathDirection::from_index(self.current_breath_index)
    }

    /// 当前呼吸序号（从 1 开始）
    pub fn breath_number(&self) -> u32 {
        self.current_breath_index / 2 + 1
    }

    /// 获取状态名称（用于日志和调试）
    pub fn name(&self) -> &'static str {
        if self.is_playing {
            self.phase.name()
        } else {
            "idle"
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::idle()
    }
}
