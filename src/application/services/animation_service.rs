use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::rules::Animation;
use crate::domain::traits::{Bot, FrameSink, MessageHandle};

/// What to do when editing a frame in place fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditFailurePolicy {
    /// Log and move on to the next frame
    #[default]
    Continue,
    /// Log and stop the animation
    Halt,
}

/// Lifecycle of one animation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationState {
    Init,
    Running { step: usize },
    Done,
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationReport {
    pub handle: MessageHandle,
    pub frames_shown: usize,
    pub failed_edits: usize,
    pub halted: bool,
}

/// Plays an [`Animation`] by posting the first frame and editing it in place
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    animation: Animation,
    delay: Duration,
    on_edit_failure: EditFailurePolicy,
}

impl AnimationDriver {
    pub fn new(animation: Animation, delay: Duration) -> Self {
        Self {
            animation,
            delay,
            on_edit_failure: EditFailurePolicy::default(),
        }
    }

    pub fn with_edit_failure_policy(mut self, policy: EditFailurePolicy) -> Self {
        self.on_edit_failure = policy;
        self
    }

    /// Run to completion. Fails only when the first frame cannot be posted.
    pub async fn run<S: FrameSink + ?Sized>(&self, sink: &S) -> Result<AnimationReport, BotError> {
        let total = self.animation.frame_count();
        let mut state = AnimationState::Init;
        let mut report: Option<AnimationReport> = None;

        loop {
            state = match state {
                AnimationState::Init => {
                    let Some(first) = self.animation.frame(0) else {
                        return Err(BotError::Internal(format!(
                            "{} animation has no frames",
                            self.animation.name()
                        )));
                    };
                    // a failed post means there is nothing to edit
                    let handle = sink.post(&first).await?;
                    report = Some(AnimationReport {
                        handle,
                        frames_shown: 1,
                        failed_edits: 0,
                        halted: false,
                    });
                    AnimationState::Running { step: 1 }
                }
                AnimationState::Running { step } if step >= total => AnimationState::Done,
                AnimationState::Running { step } => {
                    let Some(current) = report.as_mut() else {
                        return Err(BotError::Internal("animation lost its handle".to_string()));
                    };
                    tokio::time::sleep(self.delay).await;

                    let frame = self.animation.frame(step).unwrap_or_default();
                    match sink.edit(&current.handle, &frame).await {
                        Ok(()) => {
                            current.frames_shown += 1;
                            AnimationState::Running { step: step + 1 }
                        }
                        Err(e) => {
                            current.failed_edits += 1;
                            tracing::warn!(
                                "{} frame {}/{} not shown: {}",
                                self.animation.name(),
                                step,
                                total,
                                e
                            );
                            match self.on_edit_failure {
                                EditFailurePolicy::Continue => AnimationState::Running { step: step + 1 },
                                EditFailurePolicy::Halt => {
                                    current.halted = true;
                                    AnimationState::Done
                                }
                            }
                        }
                    }
                }
                AnimationState::Done => break,
            };
        }

        report.ok_or_else(|| BotError::Internal("animation never started".to_string()))
    }

    /// Start on a detached task; completion is only visible in the chat
    pub fn spawn(self, sink: Arc<dyn FrameSink>) {
        tokio::spawn(async move {
            match self.run(sink.as_ref()).await {
                Ok(report) => tracing::debug!(
                    "{} animation finished in {}: {} frames, {} failed edits",
                    self.animation.name(),
                    report.handle.chat_id,
                    report.frames_shown,
                    report.failed_edits
                ),
                Err(e) => tracing::error!("{} animation could not start: {}", self.animation.name(), e),
            }
        });
    }
}

/// Binds a bot and a chat into a [`FrameSink`]
pub struct ChannelSink {
    bot: Arc<dyn Bot>,
    chat_id: String,
}

impl ChannelSink {
    pub fn new(bot: Arc<dyn Bot>, chat_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn post(&self, text: &str) -> Result<MessageHandle, BotError> {
        self.bot.send_message(&self.chat_id, text).await
    }

    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<(), BotError> {
        self.bot.edit_message(handle, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records frames; fails the post or selected edit calls
    #[derive(Default)]
    struct RecordingSink {
        fail_post: bool,
        fail_edits: HashSet<usize>,
        edit_calls: Mutex<usize>,
        shown: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn post(&self, text: &str) -> Result<MessageHandle, BotError> {
            if self.fail_post {
                return Err(BotError::Network("post refused".to_string()));
            }
            self.shown.lock().unwrap().push(text.to_string());
            Ok(MessageHandle::new("chat", "1"))
        }

        async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<(), BotError> {
            assert_eq!(handle, &MessageHandle::new("chat", "1"));
            let call = {
                let mut calls = self.edit_calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_edits.contains(&call) {
                return Err(BotError::Network("edit refused".to_string()));
            }
            self.shown.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn driver(animation: Animation) -> AnimationDriver {
        AnimationDriver::new(animation, Duration::from_millis(300))
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_every_frame_in_order() {
        let sink = RecordingSink::default();
        let anim = Animation::Shark { length: 6, turns: 2 };
        let started = tokio::time::Instant::now();

        let report = driver(anim).run(&sink).await.unwrap();

        let expected: Vec<String> = anim.frames().collect();
        assert_eq!(*sink.shown.lock().unwrap(), expected);
        assert_eq!(report.frames_shown, 10);
        assert_eq!(report.failed_edits, 0);
        assert!(!report.halted);
        // one delay before each edit
        assert_eq!(started.elapsed(), Duration::from_millis(300 * 9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_failure_ends_session_without_edits() {
        let sink = RecordingSink {
            fail_post: true,
            ..Default::default()
        };
        let result = driver(Animation::Pendulum { frames: 30 }).run(&sink).await;
        assert!(result.is_err());
        assert_eq!(*sink.edit_calls.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_failure_is_skipped_by_default() {
        let sink = RecordingSink {
            fail_edits: [2, 3].into_iter().collect(),
            ..Default::default()
        };
        let report = driver(Animation::Pendulum { frames: 6 }).run(&sink).await.unwrap();

        assert_eq!(*sink.edit_calls.lock().unwrap(), 5);
        assert_eq!(report.failed_edits, 2);
        assert_eq!(report.frames_shown, 4);
        assert!(!report.halted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_halt_policy_stops_at_first_failed_edit() {
        let sink = RecordingSink {
            fail_edits: [2].into_iter().collect(),
            ..Default::default()
        };
        let report = driver(Animation::Pendulum { frames: 6 })
            .with_edit_failure_policy(EditFailurePolicy::Halt)
            .run(&sink)
            .await
            .unwrap();

        assert_eq!(*sink.edit_calls.lock().unwrap(), 2);
        assert_eq!(report.frames_shown, 2);
        assert!(report.halted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_frame_never_edits() {
        let sink = RecordingSink::default();
        let report = driver(Animation::Pendulum { frames: 1 }).run(&sink).await.unwrap();
        assert_eq!(report.frames_shown, 1);
        assert_eq!(*sink.edit_calls.lock().unwrap(), 0);
    }
}
