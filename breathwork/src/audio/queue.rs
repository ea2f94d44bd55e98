//! 播放命令队列
//!
//! 基于 ringbuf 的无锁单生产者单消费者队列，把播放命令送入实时音频回调
//!
//! # 使用示例
//!
//! ```
//! use std::sync::Arc;
//! use breathwork_lib::audio::queue::{CommandQueue, VoiceCommand, Voice};
//!
//! let (mut sender, mut receiver) = CommandQueue::new(8);
//! assert!(sender.send(VoiceCommand::Play(Arc::from(vec![0.5f32; 4]))));
//!
//! let mut voice = Voice::default();
//! receiver.drain_into(&mut voice);
//! assert!(voice.is_active());
//! ```

use std::sync::Arc;

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};

/// 发往音频回调的命令
#[derive(Debug, Clone)]
pub enum VoiceCommand {
    /// 从头播放一段已渲染的片段，替换当前片段
    Play(Arc<[f32]>),
    /// 停止播放
    Stop,
    /// 设置音量（0.0 - 1.0）
    Volume(f32),
}

/// 命令队列
pub struct CommandQueue;

/// 命令发送端（非实时线程）
pub struct CommandSender {
    producer: ringbuf::HeapProd<VoiceCommand>,
}

/// 命令接收端（实时音频回调）
pub struct CommandReceiver {
    consumer: ringbuf::HeapCons<VoiceCommand>,
}

impl CommandQueue {
    /// 创建新的命令队列
    ///
    /// # Returns
    ///
    /// 返回 (发送端, 接收端) 元组
    pub fn new(capacity: usize) -> (CommandSender, CommandReceiver) {
        let rb = HeapRb::<VoiceCommand>::new(capacity);
        let (producer, consumer) = rb.split();

        (CommandSender { producer }, CommandReceiver { consumer })
    }

    /// 创建具有默认容量的队列
    pub fn with_default_capacity() -> (CommandSender, CommandReceiver) {
        Self::new(16)
    }
}

impl CommandSender {
    /// 发送命令
    ///
    /// 队列已满返回 `false`
    pub fn send(&mut self, command: VoiceCommand) -> bool {
        self.producer.try_push(command).is_ok()
    }

    /// 获取可用写入空间
    pub fn available_space(&self) -> usize {
        self.producer.vacant_len()
    }
}

impl CommandReceiver {
    /// 取出一条命令
    pub fn pop(&mut self) -> Option<VoiceCommand> {
        self.consumer.try_pop()
    }

    /// 把所有待处理命令应用到声部
    pub fn drain_into(&mut self, voice: &mut Voice) {
        while let Some(command) = self.pop() {
            voice.apply(command);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

/// 音频回调中唯一的播放声部
///
/// 同一时刻最多播放一个片段
#[derive(Debug)]
pub struct Voice {
    clip: Option<Arc<[f32]>>,
    position: usize,
    volume: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            clip: None,
            position: 0,
            volume: 1.0,
        }
    }
}

impl Voice {
    pub fn apply(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Play(clip) => {
                self.clip = Some(clip);
                self.position = 0;
            }
            VoiceCommand::Stop => {
                self.clip = None;
                self.position = 0;
            }
            VoiceCommand::Volume(volume) => {
                self.volume = volume.clamp(0.0, 1.0);
            }
        }
    }

    /// 是否还有待播放的样本
    pub fn is_active(&self) -> bool {
        self.clip
            .as_ref()
            .is_some_and(|clip| self.position < clip.len())
    }

    /// 取下一个样本，播放结束后输出静音
    pub fn next_sample(&mut self) -> f32 {
        match &self.clip {
            Some(clip) if self.position < clip.len() => {
                let sample = clip[self.position] * self.volume;
                self.position += 1;
                sample
            }
            _ => 0.0,
        }
    }

    /// 填充交错输出缓冲区，单声道样本复制到所有声道
    pub fn fill_interleaved(&mut self, output: &mut [f32], channels: usize) {
        for frame in output.chunks_mut(channels.max(1)) {
            let sample = self.next_sample();
            frame.fill(sample);
        }
    }
}
