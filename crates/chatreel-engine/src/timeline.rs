// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeline engine: the playback state machine.
//!
//! States move Idle -> Playing -> (Paused | Error) -> Playing -> Completed,
//! with `reset()` returning to Idle from anywhere. Each message walks
//! queued -> typing -> sent -> [flow] -> delivered -> read, one timer at a
//! time. Only one step is ever pending, so pausing records that step and
//! the delay it still had left, and resuming reschedules exactly that.
//!
//! All state lives behind one `std::sync::Mutex`. Events are published while
//! the lock is held, so the order on the bus is the order of transitions.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chatreel_bus::{DebugLevel, EventBus, EventFilter, EventStream, factory};
use chatreel_config::ChatreelConfig;
use chatreel_config::validation::validate_config;
use chatreel_core::script::check_message;
use chatreel_core::{
    ChatreelError, Conversation, ConversationId, ConversationProgress, FlowId, Message,
    MessageStatus, PlaybackStatus, ScriptIssue, TriggerHook, TriggerKind, check_script,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::flow::FlowRun;
use crate::timer::{PendingTimer, TimerRegistry};
use crate::timing::{MAX_DELAY, Timings, initial_speed, scaled, valid_speed};

/// A unit of scheduled work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Emit queued + typing_started for the message.
    Queue(usize),
    /// Typing finished: emit typing_stopped + sent.
    Send(usize),
    /// Hand off to a flow or wait for the delivered receipt.
    AfterSent(usize),
    /// The active flow step's delay elapsed.
    FlowResolve,
    Deliver(usize),
    Read(usize),
    Restart,
}

struct TimelineState {
    conversation: Arc<Conversation>,
    timings: Timings,
    initial_speed: f64,
    debug_events: bool,
    progress: ConversationProgress,
    /// Runtime receipt state per message; `None` until sent.
    statuses: Vec<Option<MessageStatus>>,
    pending: Option<PendingTimer<Step>>,
    /// Step to reschedule on resume, with the delay it had left.
    parked: Option<(Step, Duration)>,
    timers: TimerRegistry,
    flow: Option<FlowRun>,
    accumulated: Duration,
    running_since: Option<Instant>,
    iteration: u32,
    error_recoverable: bool,
    hook: Option<Arc<dyn TriggerHook>>,
    rng: StdRng,
}

impl TimelineState {
    fn start_clock(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn stop_clock(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map(|s| s.elapsed()).unwrap_or_default()
    }

    fn snapshot(&self) -> ConversationProgress {
        ConversationProgress {
            elapsed: self.elapsed(),
            ..self.progress.clone()
        }
    }

    fn speed(&self) -> f64 {
        self.progress.speed_multiplier
    }

    /// Drop every timer, the pending step, the parked step and any flow.
    fn clear_schedule(&mut self) {
        self.timers.cancel_all();
        self.pending = None;
        self.parked = None;
        self.flow = None;
    }

    fn set_status(&mut self, index: usize, status: MessageStatus) {
        if let Some(slot) = self.statuses.get_mut(index) {
            *slot = Some(slot.map_or(status, |current| current.max(status)));
        }
    }
}

struct Inner {
    conversation_id: ConversationId,
    bus: EventBus,
    state: Mutex<TimelineState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .timers
            .cancel_all();
    }
}

/// Cloneable handle to one conversation's playback.
///
/// Every engine owns a fresh [`EventBus`]; several engines can run side by
/// side. Control calls must be made from inside a Tokio runtime because
/// they schedule timer tasks.
#[derive(Clone)]
pub struct TimelineEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TimelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineEngine")
            .field("conversation_id", &self.inner.conversation_id)
            .field("progress", &self.progress())
            .finish_non_exhaustive()
    }
}

impl TimelineEngine {
    /// Create an idle engine for `conversation`.
    ///
    /// The configuration is validated up front; the script itself is only
    /// checked when playback starts, so a broken script surfaces as a
    /// `conversation.error` event.
    pub fn new(
        conversation: impl Into<Arc<Conversation>>,
        config: &ChatreelConfig,
    ) -> Result<Self, EngineError> {
        validate_config(config).map_err(|errors| {
            EngineError::InvalidConfig(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let conversation: Arc<Conversation> = conversation.into();
        let timings = Timings::resolve(&config.playback, &conversation.settings);
        let speed = initial_speed(&config.playback, &conversation.settings);
        let state = TimelineState {
            statuses: vec![None; conversation.len()],
            conversation: conversation.clone(),
            timings,
            initial_speed: speed,
            debug_events: config.playback.debug_events,
            progress: ConversationProgress::new(speed),
            pending: None,
            parked: None,
            timers: TimerRegistry::new(),
            flow: None,
            accumulated: Duration::ZERO,
            running_since: None,
            iteration: 0,
            error_recoverable: false,
            hook: None,
            rng: StdRng::from_entropy(),
        };

        debug!(
            conversation = %conversation.id,
            messages = conversation.len(),
            flows = conversation.flows.len(),
            speed,
            "timeline engine created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                conversation_id: conversation.id.clone(),
                bus: EventBus::new(config.bus.capacity),
                state: Mutex::new(state),
            }),
        })
    }

    /// Install a hook called for `ai_trigger` / `gamification_trigger` messages.
    pub fn with_trigger_hook(self, hook: Arc<dyn TriggerHook>) -> Self {
        self.inner.lock().hook = Some(hook);
        self
    }

    /// Make typing durations reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        self.inner.lock().rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.inner.conversation_id
    }

    pub fn conversation(&self) -> Arc<Conversation> {
        self.inner.lock().conversation.clone()
    }

    /// This engine's bus.
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Shorthand for `bus().stream(filter)`.
    pub fn events(&self, filter: EventFilter) -> EventStream {
        self.inner.bus.stream(filter)
    }

    /// Read-only snapshot of the playback cursor.
    pub fn progress(&self) -> ConversationProgress {
        self.inner.lock().snapshot()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.inner.lock().progress.status
    }

    /// Runtime receipt status of message `index`; `None` until it is sent.
    pub fn message_status(&self, index: usize) -> Option<MessageStatus> {
        self.inner.lock().statuses.get(index).copied().flatten()
    }

    /// The flow currently running and its step index.
    pub fn active_flow(&self) -> Option<(FlowId, usize)> {
        self.inner
            .lock()
            .flow
            .as_ref()
            .map(|run| (run.flow().id.clone(), run.step_index()))
    }

    /// How many auto-restarts have happened since the last start or reset.
    pub fn iteration(&self) -> u32 {
        self.inner.lock().iteration
    }

    /// Timer tasks not yet finished.
    pub fn outstanding_timers(&self) -> usize {
        self.inner.lock().timers.outstanding()
    }

    /// Begin playback from index 0. Valid from Idle and Completed.
    pub fn start(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        match state.progress.status {
            PlaybackStatus::Idle | PlaybackStatus::Completed => {}
            from => {
                return Err(EngineError::InvalidTransition {
                    from,
                    action: "start",
                });
            }
        }

        state.clear_schedule();
        let speed = state.speed();
        state.progress = ConversationProgress::new(speed);
        state.statuses = vec![None; state.conversation.len()];
        state.accumulated = Duration::ZERO;
        state.running_since = None;
        state.iteration = 0;

        let blocking: Vec<ScriptIssue> = check_script(&state.conversation)
            .into_iter()
            .filter(ScriptIssue::blocks_start)
            .collect();
        if !blocking.is_empty() {
            let message = blocking
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            self.inner.fail(&mut state, message, false, None, None);
            return Ok(());
        }

        state.start_clock();
        state.progress.status = PlaybackStatus::Playing;
        let total = state.conversation.len();
        self.inner
            .publish(factory::conversation_started(self.conversation_id(), total, speed));
        info!(
            conversation = %self.inner.conversation_id,
            messages = total,
            speed,
            "playback started"
        );
        self.inner.emit_snapshot(&state);
        self.inner.queue(&mut state, 0);
        Ok(())
    }

    /// Suspend playback. The pending step keeps its remaining delay.
    pub fn pause(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        if state.progress.status != PlaybackStatus::Playing {
            return Err(EngineError::InvalidTransition {
                from: state.progress.status,
                action: "pause",
            });
        }

        let parked = state.pending.take().map(|p| (p.step, p.remaining()));
        state.timers.cancel_all();
        state.parked = parked;
        state.stop_clock();
        state.progress.status = PlaybackStatus::Paused;

        let index = state.progress.current_index;
        self.inner
            .publish(factory::conversation_paused(self.conversation_id(), index));
        info!(
            conversation = %self.inner.conversation_id,
            index,
            remaining_ms = parked.map(|(_, d)| d.as_millis() as u64).unwrap_or(0),
            "playback paused"
        );
        self.inner.emit_snapshot(&state);
        Ok(())
    }

    /// Continue after `pause()`, a `jump()` outside Playing, or a
    /// recoverable error.
    pub fn resume(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        match state.progress.status {
            PlaybackStatus::Paused => {}
            PlaybackStatus::Error if state.error_recoverable => {}
            from => {
                return Err(EngineError::InvalidTransition {
                    from,
                    action: "resume",
                });
            }
        }

        state.progress.status = PlaybackStatus::Playing;
        state.error_recoverable = false;
        state.start_clock();
        let index = state.progress.current_index;
        self.inner
            .publish(factory::conversation_resumed(self.conversation_id(), index));
        info!(conversation = %self.inner.conversation_id, index, "playback resumed");

        if let Some((step, remaining)) = state.parked.take() {
            self.inner.schedule(&mut state, step, remaining);
        }
        self.inner.emit_snapshot(&state);
        Ok(())
    }

    /// Move the cursor to `to`. Messages before it count as read.
    ///
    /// While playing, playback continues at `to` straight away; from any
    /// other state the engine lands in Paused with `to` queued.
    pub fn jump(&self, to: usize) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        let len = state.conversation.len();
        if to >= len {
            return Err(EngineError::IndexOutOfRange { index: to, len });
        }

        state.clear_schedule();
        let from = state.progress.current_index;
        for (index, slot) in state.statuses.iter_mut().enumerate() {
            *slot = (index < to).then_some(MessageStatus::Read);
        }
        state.progress.current_index = to;
        self.inner
            .publish(factory::conversation_jumped(self.conversation_id(), from, to));
        info!(conversation = %self.inner.conversation_id, from, to, "playback jumped");

        if state.progress.status == PlaybackStatus::Playing {
            self.inner.queue(&mut state, to);
        } else {
            state.stop_clock();
            state.progress.status = PlaybackStatus::Paused;
            state.error_recoverable = false;
            state.parked = Some((Step::Queue(to), Duration::ZERO));
        }
        self.inner.emit_snapshot(&state);
        Ok(())
    }

    /// Cancel everything and return to Idle at index 0.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.clear_schedule();
        let previous = state.progress.current_index;
        state.progress = ConversationProgress::new(state.initial_speed);
        state.statuses = vec![None; state.conversation.len()];
        state.accumulated = Duration::ZERO;
        state.running_since = None;
        state.iteration = 0;
        state.error_recoverable = false;

        self.inner
            .publish(factory::conversation_reset(self.conversation_id(), previous));
        info!(conversation = %self.inner.conversation_id, previous, "playback reset");
        self.inner.emit_snapshot(&state);
    }

    /// Change the speed multiplier (0.1 <= speed <= 10). Only delays scheduled
    /// after this call are affected.
    pub fn set_speed(&self, speed: f64) -> Result<(), EngineError> {
        if !valid_speed(speed) {
            return Err(EngineError::InvalidSpeed(speed));
        }
        let mut state = self.inner.lock();
        let previous = std::mem::replace(&mut state.progress.speed_multiplier, speed);
        self.inner.publish(factory::conversation_speed_changed(
            self.conversation_id(),
            previous,
            speed,
        ));
        info!(conversation = %self.inner.conversation_id, previous, speed, "speed changed");
        self.inner.emit_snapshot(&state);
        Ok(())
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: chatreel_bus::ConversationEvent) {
        self.bus.publish(event);
    }

    fn emit_snapshot(&self, state: &TimelineState) {
        if state.debug_events {
            let pending = state
                .pending
                .map(|p| format!("{:?}", p.step))
                .or_else(|| state.parked.map(|(step, _)| format!("{step:?} (parked)")));
            self.publish(factory::debug_state_snapshot(
                &self.conversation_id,
                state.snapshot(),
                pending,
            ));
        }
    }

    /// Arm a timer for `step`. It runs only if no cancel happens first.
    fn schedule(self: &Arc<Self>, state: &mut TimelineState, step: Step, delay: Duration) {
        let delay = delay.min(MAX_DELAY);
        let generation = state.timers.generation();
        state.pending = Some(PendingTimer::new(step, delay));
        debug!(
            conversation = %self.conversation_id,
            ?step,
            delay_ms = delay.as_millis() as u64,
            "step scheduled"
        );

        let weak = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(generation, step);
            }
        });
        state.timers.track(task.abort_handle());
    }

    fn fire(self: &Arc<Self>, generation: u64, step: Step) {
        let mut state = self.lock();
        if !state.timers.is_current(generation)
            || state.pending.map(|p| p.step) != Some(step)
        {
            debug!(conversation = %self.conversation_id, ?step, "dropping stale timer");
            return;
        }
        state.pending = None;
        self.run_step(&mut state, step);
    }

    fn run_step(self: &Arc<Self>, state: &mut TimelineState, step: Step) {
        match step {
            Step::Queue(index) => self.queue(state, index),
            Step::Send(index) => self.send(state, index),
            Step::AfterSent(index) => self.after_sent(state, index),
            Step::FlowResolve => self.resolve_flow_step(state),
            Step::Deliver(index) => self.deliver(state, index),
            Step::Read(index) => self.read(state, index),
            Step::Restart => self.restart(state),
        }
    }

    fn queue(self: &Arc<Self>, state: &mut TimelineState, index: usize) {
        if let Some(issue) = check_message(&state.conversation, index) {
            self.fail(state, issue.to_string(), false, Some(index), None);
            return;
        }
        let conversation = state.conversation.clone();
        let message = &conversation.messages[index];
        state.progress.current_index = index;

        let typing = scaled(state.timings.typing_duration(&mut state.rng), state.speed());
        self.publish(factory::message_queued(
            &self.conversation_id,
            index,
            message,
            typing,
        ));
        self.publish(factory::message_typing_started(
            &self.conversation_id,
            index,
            message,
        ));
        self.schedule(state, Step::Send(index), typing);
    }

    fn send(self: &Arc<Self>, state: &mut TimelineState, index: usize) {
        let conversation = state.conversation.clone();
        let message = &conversation.messages[index];
        self.publish(factory::message_typing_stopped(
            &self.conversation_id,
            index,
            message,
        ));
        state.set_status(index, MessageStatus::Sent);
        self.publish(factory::message_sent(&self.conversation_id, index, message));
        debug!(conversation = %self.conversation_id, index, sender = %message.sender, "message sent");

        if let Err(err) = invoke_hook(state.hook.as_deref(), index, message) {
            let text = format!("trigger hook failed at message {index}: {err}");
            self.publish(factory::debug_log(
                &self.conversation_id,
                DebugLevel::Warn,
                text.clone(),
            ));
            self.fail(state, text, true, Some(index), Some(Step::AfterSent(index)));
            return;
        }
        self.after_sent(state, index);
    }

    fn after_sent(self: &Arc<Self>, state: &mut TimelineState, index: usize) {
        let conversation = state.conversation.clone();
        if conversation.messages[index].flow_trigger
            && let Some(flow) = conversation.flow_at(index)
        {
            self.publish(factory::flow_triggered(&self.conversation_id, flow, index));
            info!(conversation = %self.conversation_id, flow = %flow.id, index, "flow triggered");
            match FlowRun::start(flow.clone(), index) {
                Ok(run) => self.begin_flow_step(state, run),
                Err(failure) => {
                    warn!(flow = %flow.id, reason = %failure.reason, "flow failed");
                    self.publish(factory::flow_failed(
                        &self.conversation_id,
                        &flow.id,
                        failure.step_index,
                        failure.reason,
                    ));
                    self.after_flow(state, index);
                }
            }
            return;
        }

        let delay = scaled(state.timings.delivered_delay, state.speed());
        self.schedule(state, Step::Deliver(index), delay);
    }

    fn begin_flow_step(self: &Arc<Self>, state: &mut TimelineState, run: FlowRun) {
        let step = run.current_step();
        let delay = step.step_delay();
        self.publish(factory::flow_step_started(
            &self.conversation_id,
            &run.flow().id,
            run.step_index(),
            step,
        ));
        state.flow = Some(run);
        // Flow step delays model the user's interaction time and ignore speed.
        self.schedule(state, Step::FlowResolve, delay);
    }

    fn resolve_flow_step(self: &Arc<Self>, state: &mut TimelineState) {
        let Some(mut run) = state.flow.take() else {
            warn!(conversation = %self.conversation_id, "flow step fired with no active flow");
            return;
        };
        let flow_id = run.flow().id.clone();
        let trigger_index = run.trigger_index();
        let step_index = run.step_index();
        let step = run.current_step().clone();

        match run.resolve_current() {
            Ok(outcome) => {
                self.publish(factory::flow_step_completed(
                    &self.conversation_id,
                    &flow_id,
                    step_index,
                    &step,
                    outcome,
                ));
                if run.advance() {
                    self.begin_flow_step(state, run);
                } else {
                    let result = run.finish();
                    info!(
                        conversation = %self.conversation_id,
                        flow = %flow_id,
                        steps = result.outcomes.len(),
                        "flow completed"
                    );
                    self.publish(factory::flow_completed(&self.conversation_id, result));
                    self.after_flow(state, trigger_index);
                }
            }
            Err(failure) => {
                warn!(flow = %flow_id, step_index, reason = %failure.reason, "flow failed");
                self.publish(factory::flow_failed(
                    &self.conversation_id,
                    &flow_id,
                    failure.step_index,
                    failure.reason,
                ));
                self.after_flow(state, trigger_index);
            }
        }
    }

    /// Back on the main timeline: transition pause, then the delivered receipt.
    fn after_flow(self: &Arc<Self>, state: &mut TimelineState, index: usize) {
        let delay = scaled(
            state.timings.flow_transition_delay + state.timings.delivered_delay,
            state.speed(),
        );
        self.schedule(state, Step::Deliver(index), delay);
    }

    fn deliver(self: &Arc<Self>, state: &mut TimelineState, index: usize) {
        let conversation = state.conversation.clone();
        state.set_status(index, MessageStatus::Delivered);
        self.publish(factory::message_delivered(
            &self.conversation_id,
            index,
            &conversation.messages[index],
        ));
        let delay = scaled(state.timings.read_delay, state.speed());
        self.schedule(state, Step::Read(index), delay);
    }

    fn read(self: &Arc<Self>, state: &mut TimelineState, index: usize) {
        let conversation = state.conversation.clone();
        let message = &conversation.messages[index];
        state.set_status(index, MessageStatus::Read);
        self.publish(factory::message_read(&self.conversation_id, index, message));
        self.emit_snapshot(state);

        if index + 1 >= conversation.len() || message.is_final {
            self.complete(state, index);
        } else {
            let delay = scaled(state.timings.message_delay, state.speed());
            self.schedule(state, Step::Queue(index + 1), delay);
        }
    }

    fn complete(self: &Arc<Self>, state: &mut TimelineState, final_index: usize) {
        state.stop_clock();
        state.progress.status = PlaybackStatus::Completed;
        let elapsed = state.elapsed();
        state.progress.elapsed = elapsed;
        self.publish(factory::conversation_completed(
            &self.conversation_id,
            final_index,
            elapsed,
        ));
        info!(
            conversation = %self.conversation_id,
            final_index,
            elapsed_ms = elapsed.as_millis() as u64,
            "playback completed"
        );

        if state.conversation.settings.auto_restart {
            let delay = scaled(state.timings.restart_delay, state.speed());
            self.schedule(state, Step::Restart, delay);
        }
        self.emit_snapshot(state);
    }

    fn restart(self: &Arc<Self>, state: &mut TimelineState) {
        state.iteration += 1;
        state.statuses = vec![None; state.conversation.len()];
        state.progress.current_index = 0;
        state.progress.status = PlaybackStatus::Playing;
        state.accumulated = Duration::ZERO;
        state.running_since = None;
        state.start_clock();
        self.publish(factory::conversation_restarted(
            &self.conversation_id,
            state.iteration,
        ));
        info!(
            conversation = %self.conversation_id,
            iteration = state.iteration,
            "playback restarted"
        );
        self.queue(state, 0);
    }

    /// Enter the Error state. A recoverable error parks `resume_at` so that
    /// `resume()` continues from there.
    fn fail(
        &self,
        state: &mut TimelineState,
        message: String,
        recoverable: bool,
        index: Option<usize>,
        resume_at: Option<Step>,
    ) {
        state.timers.cancel_all();
        state.pending = None;
        if !recoverable {
            state.flow = None;
        }
        state.parked = resume_at
            .filter(|_| recoverable)
            .map(|step| (step, Duration::ZERO));
        state.stop_clock();
        state.progress.status = PlaybackStatus::Error;
        state.error_recoverable = recoverable;

        warn!(
            conversation = %self.conversation_id,
            recoverable,
            index,
            error = %message,
            "playback error"
        );
        self.publish(factory::conversation_error(
            &self.conversation_id,
            message,
            recoverable,
            index,
        ));
        self.emit_snapshot(state);
    }
}

fn invoke_hook(
    hook: Option<&dyn TriggerHook>,
    index: usize,
    message: &Message,
) -> Result<(), ChatreelError> {
    let Some(hook) = hook else {
        return Ok(());
    };
    if message.ai_trigger {
        call_hook(hook, TriggerKind::Ai, index, message)?;
    }
    if message.gamification_trigger {
        call_hook(hook, TriggerKind::Gamification, index, message)?;
    }
    Ok(())
}

/// A panicking hook is reported as an ordinary hook error.
fn call_hook(
    hook: &dyn TriggerHook,
    kind: TriggerKind,
    index: usize,
    message: &Message,
) -> Result<(), ChatreelError> {
    catch_unwind(AssertUnwindSafe(|| hook.on_trigger(kind, index, message))).unwrap_or_else(
        |payload| {
            Err(ChatreelError::Playback {
                message: format!("{kind} hook panicked: {}", panic_message(payload.as_ref())),
                recoverable: true,
            })
        },
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
