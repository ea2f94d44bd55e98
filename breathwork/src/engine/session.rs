//! 呼吸引擎
//!
//! 单个 tokio 任务串行处理命令和计时器到期，驱动 [`PhaseSequencer`]，
//! 播放提示音并把事件按顺序通知订阅者
//!
//! # 使用示例
//!
//! ```no_run
//! use std::sync::Arc;
//! use breathwork_lib::audio::CueBank;
//! use breathwork_lib::engine::BreathingEngine;
//! use breathwork_lib::state::SettingsHolder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Arc::new(SettingsHolder::default());
//! let engine = BreathingEngine::with_tokio_timer(settings, CueBank::silent());
//!
//! let mut events = engine.subscribe().await;
//! engine.start().await?;
//!
//! while let Some(event) = events.recv().await {
//!     if event.is_terminal() {
//!         break;
//!     }
//! }
//!
//! engine.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audio::CueBank;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::EngineEvent;
use crate::engine::sequencer::{PhaseSequencer, PhaseTick, Step};
use crate::state::{BreathSettings, PhaseSet, Progress, RunState, SettingsHolder};
use crate::timer::{PhaseTimer, TimerService, TokioTimerService};

/// 订阅者通道容量
const LISTENER_CAPACITY: usize = 64;

/// 命令通道容量
const COMMAND_CAPACITY: usize = 16;

type Listeners = Arc<Mutex<Vec<mpsc::Sender<EngineEvent>>>>;

/// 对外发布的快照：运行状态和本次练习锁定的阶段集合
#[derive(Debug, Clone)]
struct Snapshot {
    run: RunState,
    phase_set: PhaseSet,
}

impl Snapshot {
    fn idle(phase_set: PhaseSet) -> Self {
        Self {
            run: RunState::idle(),
            phase_set,
        }
    }

    /// 按锁定的阶段集合投影进度，其余参数取当前配置
    fn progress(&self, settings: &BreathSettings) -> Option<Progress> {
        Progress::project(&self.run, &locked_view(settings, self.phase_set))
    }
}

/// 发往引擎任务的命令
enum EngineCommand {
    Start { reply: oneshot::Sender<()> },
    Stop { reply: oneshot::Sender<bool> },
    Shutdown { reply: oneshot::Sender<()> },
}

/// 呼吸引擎句柄
///
/// 丢弃句柄会终止引擎任务并取消挂起的计时器
pub struct BreathingEngine {
    /// 命令发送器
    commands: mpsc::Sender<EngineCommand>,
    /// 当前快照（无锁读取）
    state: Arc<ArcSwap<Snapshot>>,
    /// 共享配置
    settings: Arc<SettingsHolder>,
    /// 事件订阅者
    listeners: Listeners,
    /// 引擎任务
    task: Option<JoinHandle<()>>,
}

impl BreathingEngine {
    /// 启动引擎任务
    ///
    /// 必须在 tokio 运行时中调用
    ///
    /// # Arguments
    ///
    /// * `settings` - 共享配置，每次决策时重新读取
    /// * `cues` - 引擎独占的两个提示音
    /// * `timers` - 计时服务
    pub fn spawn(
        settings: Arc<SettingsHolder>,
        cues: CueBank,
        timers: Arc<dyn TimerService>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (timer, fired_rx) = PhaseTimer::new(timers);
        let state = Arc::new(ArcSwap::from_pointee(Snapshot::idle(
            settings.phase_set(),
        )));
        let listeners: Listeners = Arc::new(Mutex::new(Vec::new()));

        let worker = EngineTask {
            sequencer: PhaseSequencer::new(),
            timer,
            cues,
            settings: Arc::clone(&settings),
            state: Arc::clone(&state),
            listeners: Arc::clone(&listeners),
        };

        let task = tokio::spawn(worker.run(command_rx, fired_rx));
        debug!("Breathing engine spawned");

        Self {
            commands: command_tx,
            state,
            settings,
            listeners,
            task: Some(task),
        }
    }

    /// 使用 tokio 计时器启动引擎
    pub fn with_tokio_timer(settings: Arc<SettingsHolder>, cues: CueBank) -> Self {
        Self::spawn(settings, cues, Arc::new(TokioTimerService))
    }

    /// 开始练习
    ///
    /// 正在练习时调用会从第 1 轮重新开始
    pub async fn start(&self) -> EngineResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Start { reply }).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// 停止练习
    ///
    /// 返回停止前是否正在练习
    pub async fn stop(&self) -> EngineResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Stop { reply }).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// 停止练习并结束引擎任务
    pub async fn shutdown(mut self) -> EngineResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Shutdown { reply }).await?;
        rx.await.map_err(|_| EngineError::Closed)?;

        if let Some(task) = self.task.take() {
            task.await?;
        }

        info!("Breathing engine shut down");
        Ok(())
    }

    /// 订阅引擎事件
    pub async fn subscribe(&self) -> mpsc::Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel(LISTENER_CAPACITY);
        let mut listeners = self.listeners.lock().await;
        listeners.push(tx);
        rx
    }

    /// 当前运行状态
    ///
    /// 此方法是无锁的
    pub fn run_state(&self) -> Arc<RunState> {
        Arc::new(self.state.load().run.clone())
    }

    /// 当前进度，空闲时为 `None`
    ///
    /// 与 tick 事件一致，按开始时锁定的阶段集合投影
    pub fn progress(&self) -> Option<Progress> {
        self.state.load().progress(&self.settings.get())
    }

    pub fn is_playing(&self) -> bool {
        self.state.load().run.is_playing
    }

    /// 共享配置
    pub fn settings(&self) -> &Arc<SettingsHolder> {
        &self.settings
    }

    async fn send(&self, command: EngineCommand) -> EngineResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::Closed)
    }
}

impl Drop for BreathingEngine {
    fn drop(&mut self) {
        // 任务被丢弃时计时器随之取消
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Breathing engine aborted");
        }
    }
}

/// 引擎任务持有的全部状态
struct EngineTask {
    sequencer: PhaseSequencer,
    timer: PhaseTimer,
    cues: CueBank,
    settings: Arc<SettingsHolder>,
    state: Arc<ArcSwap<Snapshot>>,
    listeners: Listeners,
}

impl EngineTask {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<EngineCommand>,
        mut fired: mpsc::UnboundedReceiver<u64>,
    ) {
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(EngineCommand::Start { reply }) => {
                        self.start().await;
                        let _ = reply.send(());
                    }
                    Some(EngineCommand::Stop { reply }) => {
                        let was_playing = self.stop().await;
                        let _ = reply.send(was_playing);
                    }
                    Some(EngineCommand::Shutdown { reply }) => {
                        self.stop().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        debug!("Engine handle dropped");
                        break;
                    }
                },
                Some(generation) = fired.recv() => {
                    if self.timer.accept(generation) {
                        self.on_timer_expired().await;
                    }
                }
            }
        }

        self.timer.cancel();
        debug!("Engine task exiting");
    }

    async fn start(&mut self) {
        if self.sequencer.is_playing() {
            info!("Restarting breathing run");
        }
        self.timer.cancel();

        let settings = self.settings.get();
        info!(
            breaths = settings.breath_count,
            rounds = settings.round_count,
            speed = %settings.speed,
            phases = %settings.phase_set,
            "Breathing run started"
        );

        let step = self.sequencer.start(&settings);
        notify(
            &self.listeners,
            EngineEvent::Started {
                settings: (*settings).clone(),
            },
        )
        .await;
        self.apply(step, &settings).await;
    }

    async fn stop(&mut self) -> bool {
        self.timer.cancel();
        if !self.sequencer.is_playing() {
            return false;
        }

        self.sequencer.stop();
        self.publish_state();
        info!("Breathing run stopped");
        notify(&self.listeners, EngineEvent::Stopped).await;
        true
    }

    async fn on_timer_expired(&mut self) {
        let settings = self.settings.get();
        let step = self.sequencer.on_timer_expired(&settings);
        self.apply(step, &settings).await;
    }

    async fn apply(&mut self, step: Step, settings: &BreathSettings) {
        match step {
            Step::Tick(tick) => {
                self.timer.arm(tick.delay);
                self.publish_state();
                self.play(&tick);

                debug!(
                    phase = %tick.state.phase.name(),
                    round = tick.state.current_round,
                    breath_index = tick.state.current_breath_index,
                    delay_ms = tick.delay.as_millis() as u64,
                    "Phase tick"
                );

                let view = locked_view(settings, self.sequencer.phase_set());
                notify(&self.listeners, EngineEvent::tick(&tick, &view)).await;
            }
            Step::Finished => {
                self.timer.cancel();
                self.publish_state();
                info!("Breathing run finished");
                notify(&self.listeners, EngineEvent::Finished).await;
            }
            Step::Idle => {}
        }
    }

    fn play(&mut self, tick: &PhaseTick) {
        let Some(playback) = tick.cue else {
            return;
        };

        if let Err(e) = self.cues.play_at(playback.cue, playback.rate) {
            warn!(cue = %playback.cue, rate = playback.rate, error = %e, "Cue playback failed");
        }
    }

    fn publish_state(&self) {
        self.state.store(Arc::new(Snapshot {
            run: self.sequencer.state().clone(),
            phase_set: self.sequencer.phase_set(),
        }));
    }
}

/// 进度按开始时锁定的阶段集合投影
fn locked_view(settings: &BreathSettings, phase_set: PhaseSet) -> BreathSettings {
    BreathSettings {
        phase_set,
        ..settings.clone()
    }
}

/// 按顺序通知所有订阅者
///
/// 使用 try_send 避免阻塞引擎；已关闭的订阅者被移除
async fn notify(listeners: &Listeners, event: EngineEvent) {
    let mut listeners = listeners.lock().await;
    listeners.retain(|listener| match listener.try_send(event.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(event = event.name(), "Engine event dropped for a slow subscriber");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    });
}
