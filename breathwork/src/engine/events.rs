//! 引擎事件
//!
//! 引擎在每次状态变化后按顺序发给所有订阅者，供界面渲染

use serde::Serialize;

use crate::engine::sequencer::{CuePlayback, PhaseTick};
use crate::state::{BreathSettings, Progress, RunState};

/// 引擎事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent {
    /// 练习开始（或重新开始）
    Started { settings: BreathSettings },
    /// 进入一个新的计时步
    Tick {
        state: RunState,
        progress: Option<Progress>,
        cue: Option<CuePlayback>,
        delay_ms: u64,
    },
    /// 所有轮次完成
    Finished,
    /// 被手动停止
    Stopped,
}

impl EngineEvent {
    pub(crate) fn tick(tick: &PhaseTick, settings: &BreathSettings) -> Self {
        EngineEvent::Tick {
            state: tick.state.clone(),
            progress: Progress::project(&tick.state, settings),
            cue: tick.cue,
            delay_ms: tick.delay.as_millis() as u64,
        }
    }

    /// 是否表示练习已结束
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineEvent::Finished | EngineEvent::Stopped)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Started { .. } => "started",
            EngineEvent::Tick { .. } => "tick",
            EngineEvent::Finished => "finished",
            EngineEvent::Stopped => "stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CueKind;
    use std::time::Duration;

    #[test]
    fn test_tick_event_carries_progress() {
        let settings = BreathSettings::default();
        let tick = PhaseTick {
            state: RunState::started(),
            cue: Some(CuePlayback {
                cue: CueKind::BreathIn,
                rate: 0.5,
            }),
            delay: Duration::from_millis(2500),
        };

        let event = EngineEvent::tick(&tick, &settings);
        match &event {
            EngineEvent::Tick {
                progress, delay_ms, ..
            } => {
                assert_eq!(*delay_ms, 2500);
                assert_eq!(progress.as_ref().unwrap().breath_number, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(EngineEvent::Finished).unwrap();
        assert_eq!(json["type"], "finished");

        let started = EngineEvent::Started {
            settings: BreathSettings::default(),
        };
        let json = serde_json::to_value(&started).unwrap();
        assert_eq!(json["type"], "started");
        assert_eq!(json["payload"]["settings"]["speed"], "medium");
    }

    #[test]
    fn test_terminal_events() {
        assert!(EngineEvent::Finished.is_terminal());
        assert!(EngineEvent::Stopped.is_terminal());
        assert_eq!(EngineEvent::Stopped.name(), "stopped");
    }
}
