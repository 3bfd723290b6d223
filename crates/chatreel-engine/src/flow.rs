// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow sub-executor: the cursor over an interactive flow's steps.
//!
//! A [`FlowRun`] is created when a `flow_trigger` message is sent and lives
//! until its last step resolves, a step fails, or playback is reset. The
//! timeline drives it one step at a time so that pausing mid-flow keeps the
//! cursor where it was.

use std::collections::BTreeMap;

use chatreel_core::{Flow, FlowResult, FlowStep, FlowStepContent, StepOutcome};

const DEFAULT_UPLOAD_NAME: &str = "photo.jpg";

/// Why a flow could not continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFailure {
    /// The failing step, or `None` when the flow failed before any step.
    pub step_index: Option<usize>,
    pub reason: String,
}

/// Engine-owned cursor over a triggered flow.
#[derive(Debug, Clone)]
pub struct FlowRun {
    flow: Flow,
    trigger_index: usize,
    step_index: usize,
    outcomes: Vec<StepOutcome>,
}

impl FlowRun {
    /// Begin a run. A flow without steps fails immediately.
    pub fn start(flow: Flow, trigger_index: usize) -> Result<Self, FlowFailure> {
        if flow.steps.is_empty() {
            return Err(FlowFailure {
                step_index: None,
                reason: "flow has no steps".to_string(),
            });
        }
        Ok(Self {
            flow,
            trigger_index,
            step_index: 0,
            outcomes: Vec::new(),
        })
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn trigger_index(&self) -> usize {
        self.trigger_index
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// The step currently waiting to resolve.
    pub fn current_step(&self) -> &FlowStep {
        &self.flow.steps[self.step_index]
    }

    /// Resolve the current step, recording its outcome.
    pub fn resolve_current(&mut self) -> Result<StepOutcome, FlowFailure> {
        let outcome = resolve_step(&self.current_step().content).map_err(|reason| FlowFailure {
            step_index: Some(self.step_index),
            reason,
        })?;
        self.outcomes.push(outcome.clone());
        Ok(outcome)
    }

    /// Move to the next step. Returns false after the last one.
    pub fn advance(&mut self) -> bool {
        if self.step_index + 1 < self.flow.steps.len() {
            self.step_index += 1;
            true
        } else {
            false
        }
    }

    /// Consume the run into its aggregate result.
    pub fn finish(self) -> FlowResult {
        FlowResult {
            flow_id: self.flow.id,
            outcomes: self.outcomes,
        }
    }
}

/// Process one step's content into the outcome the simulated user produces.
pub fn resolve_step(content: &FlowStepContent) -> Result<StepOutcome, String> {
    match content {
        FlowStepContent::ImageUpload { file_name, .. } => Ok(StepOutcome::ImageUploaded {
            file_name: file_name
                .clone()
                .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string()),
        }),
        FlowStepContent::PointsDisplay { points, .. } => {
            Ok(StepOutcome::PointsShown { points: *points })
        }
        FlowStepContent::RewardGallery { rewards, selected } => {
            if rewards.is_empty() {
                return Err("reward gallery has no rewards".to_string());
            }
            let index = selected.unwrap_or(0);
            rewards
                .get(index)
                .map(|reward| StepOutcome::RewardSelected {
                    reward: reward.clone(),
                })
                .ok_or_else(|| {
                    format!(
                        "selected reward {index} is out of range ({} rewards)",
                        rewards.len()
                    )
                })
        }
        FlowStepContent::VipConfirmation { tier, .. } => {
            if tier.trim().is_empty() {
                return Err("vip confirmation has no tier".to_string());
            }
            Ok(StepOutcome::VipConfirmed { tier: tier.clone() })
        }
        FlowStepContent::Form { fields } => {
            if fields.is_empty() {
                return Err("form has no fields".to_string());
            }
            let mut values = BTreeMap::new();
            for field in fields {
                match field.value.as_deref() {
                    Some(value) if !value.is_empty() => {
                        values.insert(field.name.clone(), value.to_string());
                    }
                    _ if field.required => {
                        return Err(format!("required field `{}` has no value", field.name));
                    }
                    _ => {}
                }
            }
            Ok(StepOutcome::FormSubmitted { values })
        }
    }
}
