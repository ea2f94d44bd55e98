//! 状态管理模块
//!
//! 提供练习配置、运行状态和进度投影
//!
//! # 模块结构
//!
//! - `config` - 练习配置、预设加载和共享配置
//! - `error` - 配置相关错误类型
//! - `run_state` - 运行状态和阶段定义
//! - `progress` - 由运行状态推导的进度

mod config;
mod error;
mod progress;
mod run_state;

pub use config::{
    BreathSettings, PhaseSet, PresetLoader, SettingsHolder, Speed, BREATH_COUNT_RANGE,
    ROUND_COUNT_RANGE,
};
pub use error::{ConfigError, ConfigResult};
pub use progress::{phase_label, Progress, RoundProgress};
pub use run_state::{BreathDirection, Phase, RunState};
