//! 呼吸练习引擎
//!
//! # 模块结构
//!
//! - `sequencer` - 纯逻辑的阶段状态机
//! - `session` - 驱动状态机的异步引擎任务
//! - `events` - 发给订阅者的引擎事件
//! - `error` - 引擎错误类型

pub mod error;
pub mod events;
pub mod sequencer;
pub mod session;

pub use error::{EngineError, EngineResult};
pub use events::EngineEvent;
pub use sequencer::{
    breath_cue, plan_run, planned_duration, CuePlayback, PhaseSequencer, PhaseTick, Step,
    REST_MS, RETENTION_MS,
};
pub use session::BreathingEngine;
