// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Results produced by resolving flow steps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{FlowId, FlowStepKind, Reward};

/// What a single resolved flow step produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepOutcome {
    ImageUploaded { file_name: String },
    PointsShown { points: u32 },
    RewardSelected { reward: Reward },
    VipConfirmed { tier: String },
    FormSubmitted { values: BTreeMap<String, String> },
}

impl StepOutcome {
    /// The step kind this outcome resolves.
    pub fn kind(&self) -> FlowStepKind {
        match self {
            StepOutcome::ImageUploaded { .. } => FlowStepKind::ImageUpload,
            StepOutcome::PointsShown { .. } => FlowStepKind::PointsDisplay,
            StepOutcome::RewardSelected { .. } => FlowStepKind::RewardGallery,
            StepOutcome::VipConfirmed { .. } => FlowStepKind::VipConfirmation,
            StepOutcome::FormSubmitted { .. } => FlowStepKind::Form,
        }
    }
}

/// Aggregate result of a completed flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    pub flow_id: FlowId,
    /// One outcome per step, in step order.
    pub outcomes: Vec<StepOutcome>,
}

impl FlowResult {
    /// The outcome of the last step.
    pub fn terminal(&self) -> Option<&StepOutcome> {
        self.outcomes.last()
    }

    /// The reward picked in a gallery step, if the flow had one.
    pub fn selected_reward(&self) -> Option<&Reward> {
        self.outcomes.iter().rev().find_map(|o| match o {
            StepOutcome::RewardSelected { reward } => Some(reward),
            _ => None,
        })
    }

    /// Total points shown across all points-display steps.
    pub fn points(&self) -> u32 {
        self.outcomes
            .iter()
            .map(|o| match o {
                StepOutcome::PointsShown { points } => *points,
                _ => 0,
            })
            .sum()
    }
}
