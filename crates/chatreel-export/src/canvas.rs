// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A software chat canvas that renders playback state as coloured shapes.
//!
//! The canvas follows a conversation's events and draws a header bar,
//! message bubbles (user on the right, business on the left), receipt
//! ticks, a typing indicator and a flow card. It does not rasterise text;
//! bubble widths follow the preview length. This is enough to export a
//! recognisable GIF without a browser.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chatreel_bus::{ConversationEvent, EventBus, EventFilter, EventKind, Subscription};
use chatreel_core::{ChatreelError, MessageStatus, RenderSurface, Sender, SurfaceFrame};
use image::{Rgba, RgbaImage};

const BACKGROUND: Rgba<u8> = Rgba([236, 229, 221, 255]);
const HEADER: Rgba<u8> = Rgba([7, 94, 84, 255]);
const USER_BUBBLE: Rgba<u8> = Rgba([220, 248, 198, 255]);
const BUSINESS_BUBBLE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TICK_SENT: Rgba<u8> = Rgba([146, 146, 146, 255]);
const TICK_READ: Rgba<u8> = Rgba([52, 183, 241, 255]);
const TYPING_DOT: Rgba<u8> = Rgba([120, 120, 120, 255]);
const FLOW_CARD: Rgba<u8> = Rgba([37, 211, 102, 255]);

const HEADER_HEIGHT: u32 = 40;
const MARGIN: u32 = 8;
const BUBBLE_HEIGHT: u32 = 24;
const GAP: u32 = 6;
const TICK: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
struct Bubble {
    index: usize,
    sender: Sender,
    chars: usize,
    status: MessageStatus,
}

#[derive(Debug, Default)]
struct CanvasState {
    bubbles: Vec<Bubble>,
    typing: Option<Sender>,
    flow_step: Option<usize>,
}

impl CanvasState {
    fn bubble_mut(&mut self, index: usize) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.index == index)
    }

    fn apply(&mut self, event: &ConversationEvent) {
        match &event.kind {
            EventKind::ConversationStarted { .. }
            | EventKind::ConversationReset { .. }
            | EventKind::ConversationRestarted { .. } => *self = CanvasState::default(),
            EventKind::ConversationJumped { to_index, .. } => {
                self.bubbles.retain(|b| b.index < *to_index);
                self.typing = None;
                self.flow_step = None;
            }
            EventKind::MessageTypingStarted { sender, .. } => self.typing = Some(*sender),
            EventKind::MessageTypingStopped { .. } => self.typing = None,
            EventKind::MessageSent {
                index,
                sender,
                preview,
                ..
            } => {
                self.typing = None;
                self.bubbles.push(Bubble {
                    index: *index,
                    sender: *sender,
                    chars: preview.chars().count(),
                    status: MessageStatus::Sent,
                });
            }
            EventKind::MessageDelivered { index, .. } => {
                if let Some(bubble) = self.bubble_mut(*index) {
                    bubble.status = bubble.status.max(MessageStatus::Delivered);
                }
            }
            EventKind::MessageRead { index, .. } => {
                if let Some(bubble) = self.bubble_mut(*index) {
                    bubble.status = MessageStatus::Read;
                }
            }
            EventKind::FlowStepStarted { step_index, .. } => self.flow_step = Some(*step_index),
            EventKind::FlowCompleted { .. } | EventKind::FlowFailed { .. } => {
                self.flow_step = None;
            }
            _ => {}
        }
    }
}

/// Software [`RenderSurface`] that draws the chat from bus events.
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct BubbleCanvas {
    width: u32,
    height: u32,
    state: Arc<Mutex<CanvasState>>,
    attached: Arc<AtomicBool>,
}

impl BubbleCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(64),
            height: height.max(64),
            state: Arc::new(Mutex::new(CanvasState::default())),
            attached: Arc::new(AtomicBool::new(true)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CanvasState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Update the canvas from one event.
    pub fn apply(&self, event: &ConversationEvent) {
        self.lock().apply(event);
    }

    /// Keep the canvas in sync with `bus` until the subscription is dropped.
    pub fn follow(&self, bus: &EventBus) -> Subscription {
        let canvas = self.clone();
        bus.subscribe(
            EventFilter::type_prefix("conversation")
                .or(EventFilter::type_prefix("message"))
                .or(EventFilter::type_prefix("flow")),
            move |event| canvas.apply(event),
        )
    }

    /// Number of bubbles currently shown.
    pub fn bubble_count(&self) -> usize {
        self.lock().bubbles.len()
    }

    pub fn is_typing(&self) -> bool {
        self.lock().typing.is_some()
    }

    /// Remove the canvas from the "render tree"; later captures fail.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    /// Draw the current state.
    pub fn render(&self) -> RgbaImage {
        let state = self.lock();
        let mut img = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        fill_rect(&mut img, 0, 0, self.width, HEADER_HEIGHT, HEADER);

        let max_bubble = self.width * 7 / 10;
        let mut rows: Vec<(u32, u32, Rgba<u8>, Option<Rgba<u8>>)> = Vec::new();
        for bubble in &state.bubbles {
            let width = (40 + bubble.chars as u32 * 4).min(max_bubble);
            let (x, fill) = match bubble.sender {
                Sender::User => (self.width - MARGIN - width, USER_BUBBLE),
                Sender::Business => (MARGIN, BUSINESS_BUBBLE),
            };
            let tick = match bubble.status {
                MessageStatus::Read => TICK_READ,
                _ => TICK_SENT,
            };
            rows.push((x, width, fill, Some(tick)));
        }
        if let Some(sender) = state.typing {
            let x = match sender {
                Sender::User => self.width - MARGIN - 48,
                Sender::Business => MARGIN,
            };
            rows.push((x, 48, BUSINESS_BUBBLE, None));
        }

        // Newest rows sit at the bottom; older ones scroll off the top.
        let card_height = if state.flow_step.is_some() { 60 } else { 0 };
        let mut bottom = self.height.saturating_sub(MARGIN + card_height);
        for (i, (x, width, fill, tick)) in rows.iter().rev().enumerate() {
            let Some(top) = bottom.checked_sub(BUBBLE_HEIGHT) else {
                break;
            };
            if top < HEADER_HEIGHT + MARGIN {
                break;
            }
            fill_rect(&mut img, *x, top, *width, BUBBLE_HEIGHT, *fill);
            match tick {
                Some(color) => {
                    let tx = x + width - MARGIN - TICK;
                    let ty = top + BUBBLE_HEIGHT - MARGIN;
                    fill_rect(&mut img, tx, ty, TICK, TICK, *color);
                }
                None if i == 0 => {
                    for dot in 0..3 {
                        fill_rect(&mut img, x + 12 + dot * 10, top + 10, 4, 4, TYPING_DOT);
                    }
                }
                None => {}
            }
            bottom = top.saturating_sub(GAP);
        }

        if let Some(step) = state.flow_step {
            let top = self.height.saturating_sub(MARGIN + card_height) + GAP;
            fill_rect(
                &mut img,
                MARGIN,
                top,
                self.width.saturating_sub(2 * MARGIN),
                card_height - GAP,
                FLOW_CARD,
            );
            // One marker per step reached.
            for s in 0..=step as u32 {
                fill_rect(&mut img, 2 * MARGIN + s * 10, top + MARGIN, 6, 6, BUSINESS_BUBBLE);
            }
        }
        img
    }
}

impl RenderSurface for BubbleCanvas {
    fn name(&self) -> &str {
        "bubble-canvas"
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn capture(&self) -> Result<SurfaceFrame, ChatreelError> {
        if !self.is_attached() {
            return Err(ChatreelError::Capture {
                message: "bubble canvas is detached".into(),
                source: None,
            });
        }
        let img = self.render();
        Ok(SurfaceFrame {
            width: img.width(),
            height: img.height(),
            rgba: img.into_raw(),
        })
    }
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(width).min(img.width());
    let y_end = y.saturating_add(height).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}
