// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural checks over conversation scripts.
//!
//! Issues are scoped so the engine can decide when each one matters:
//! script- and flow-scoped errors stop playback at `start()`, while
//! message-scoped errors only surface when playback reaches that index.

use std::collections::HashSet;
use std::fmt;

use crate::types::{Conversation, FlowId};

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// Where an issue was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueScope {
    Script,
    Message(usize),
    Flow(FlowId),
}

impl fmt::Display for IssueScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueScope::Script => write!(f, "script"),
            IssueScope::Message(i) => write!(f, "messages[{i}]"),
            IssueScope::Flow(id) => write!(f, "flow `{id}`"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptIssue {
    pub severity: Severity,
    pub scope: IssueScope,
    pub message: String,
}

impl ScriptIssue {
    fn error(scope: IssueScope, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            scope,
            message: message.into(),
        }
    }

    fn warning(scope: IssueScope, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            scope,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Errors that must stop playback before the first message.
    pub fn blocks_start(&self) -> bool {
        self.is_error() && !matches!(self.scope, IssueScope::Message(_))
    }
}

impl fmt::Display for ScriptIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}: {}", self.scope, self.message)
    }
}

/// Check a single message for problems that make it unplayable.
pub fn check_message(conversation: &Conversation, index: usize) -> Option<ScriptIssue> {
    let Some(message) = conversation.message(index) else {
        return Some(ScriptIssue::error(
            IssueScope::Message(index),
            format!(
                "index out of range (script has {} messages)",
                conversation.len()
            ),
        ));
    };
    if message.content.is_empty() {
        return Some(ScriptIssue::error(
            IssueScope::Message(index),
            format!("message `{}` has neither text nor media", message.id),
        ));
    }
    None
}

/// Run every structural check and return all findings (never fails fast).
pub fn check_script(conversation: &Conversation) -> Vec<ScriptIssue> {
    let mut issues = Vec::new();

    if conversation.is_empty() {
        issues.push(ScriptIssue::error(
            IssueScope::Script,
            "conversation has no messages",
        ));
    }

    let speed = conversation.settings.speed_multiplier;
    if !(speed.is_finite() && speed > 0.0) {
        issues.push(ScriptIssue::error(
            IssueScope::Script,
            format!("settings.speed_multiplier must be positive, got {speed}"),
        ));
    }

    if let (Some(min), Some(max)) = (
        conversation.settings.typing_min_ms,
        conversation.settings.typing_max_ms,
    ) && min > max
    {
        issues.push(ScriptIssue::error(
            IssueScope::Script,
            format!("settings.typing_min_ms ({min}) exceeds typing_max_ms ({max})"),
        ));
    }

    let mut seen_ids = HashSet::new();
    for (index, message) in conversation.messages.iter().enumerate() {
        if !seen_ids.insert(&message.id) {
            issues.push(ScriptIssue::warning(
                IssueScope::Message(index),
                format!("duplicate message id `{}`", message.id),
            ));
        }
        if let Some(issue) = check_message(conversation, index) {
            issues.push(issue);
        }
        if message.flow_trigger && conversation.flow_at(index).is_none() {
            issues.push(ScriptIssue::warning(
                IssueScope::Message(index),
                "flow_trigger is set but no flow is defined for this index",
            ));
        }
    }

    let mut seen_indices = HashSet::new();
    for flow in &conversation.flows {
        let scope = IssueScope::Flow(flow.id.clone());
        let index = flow.trigger_at_message_index;
        if index >= conversation.len() {
            issues.push(ScriptIssue::error(
                scope.clone(),
                format!(
                    "trigger_at_message_index {index} is out of range (script has {} messages)",
                    conversation.len()
                ),
            ));
            continue;
        }
        if !seen_indices.insert(index) {
            issues.push(ScriptIssue::warning(
                scope.clone(),
                format!("another flow already triggers at index {index}; this one is ignored"),
            ));
        }
        if !conversation.messages[index].flow_trigger {
            issues.push(ScriptIssue::warning(
                scope.clone(),
                format!("message {index} does not set flow_trigger, so the flow never runs"),
            ));
        }
        if flow.steps.is_empty() {
            issues.push(ScriptIssue::warning(
                scope,
                "flow has no steps and will fail when triggered",
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConversationBuilder;
    use crate::types::{Flow, FlowStep, FlowStepContent, Message, MessageContent};

    fn points_step() -> FlowStep {
        FlowStep::new(
            "s1",
            100,
            FlowStepContent::PointsDisplay {
                points: 10,
                label: "points".into(),
            },
        )
    }

    #[test]
    fn clean_script_has_no_issues() {
        let conv = ConversationBuilder::new("c1")
            .message(Message::user("m0", "hi"))
            .message(Message::business("m1", "hello").with_flow_trigger())
            .flow(Flow::new("f1", "points", 1).step(points_step()))
            .build();
        assert!(check_script(&conv).is_empty());
    }

    #[test]
    fn empty_script_blocks_start() {
        let conv = ConversationBuilder::new("empty").build();
        let issues = check_script(&conv);
        assert!(issues.iter().any(|i| i.blocks_start()));
    }

    #[test]
    fn flow_out_of_range_blocks_start() {
        let conv = ConversationBuilder::new("c1")
            .message(Message::user("m0", "hi"))
            .flow(Flow::new("f9", "late", 9).step(points_step()))
            .build();
        let issues = check_script(&conv);
        let issue = issues
            .iter()
            .find(|i| i.scope == IssueScope::Flow(FlowId("f9".into())))
            .expect("flow issue");
        assert!(issue.blocks_start());
        assert!(issue.to_string().contains("out of range"));
    }

    #[test]
    fn empty_message_is_message_scoped() {
        let mut blank = Message::business("m1", "");
        blank.content = MessageContent::default();
        let conv = ConversationBuilder::new("c1")
            .message(Message::user("m0", "hi"))
            .message(blank)
            .build();
        let issues = check_script(&conv);
        let issue = issues.iter().find(|i| i.is_error()).expect("error issue");
        assert_eq!(issue.scope, IssueScope::Message(1));
        assert!(!issue.blocks_start());
    }

    #[test]
    fn dangling_flow_trigger_is_a_warning() {
        let conv = ConversationBuilder::new("c1")
            .message(Message::user("m0", "hi").with_flow_trigger())
            .build();
        let issues = check_script(&conv);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn inverted_typing_bounds_are_reported() {
        let mut conv = ConversationBuilder::new("c1")
            .message(Message::user("m0", "hi"))
            .build();
        conv.settings.typing_min_ms = Some(900);
        conv.settings.typing_max_ms = Some(100);
        assert!(check_script(&conv).iter().any(|i| i.blocks_start()));
    }
}
