// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatreel check`: report structural problems in a script.
//!
//! With `--plain`, disables colored output.

use std::io::IsTerminal;

use chatreel_core::{Conversation, ScriptIssue, Severity, check_script};

/// Print every issue and return the exit code (1 if any error was found).
pub fn run_check(conversation: &Conversation, plain: bool) -> i32 {
    let use_color = !plain && std::io::stdout().is_terminal();
    let issues = check_script(conversation);

    println!();
    println!("  chatreel check: {}", conversation.id);
    println!("  {}", "-".repeat(50));
    println!(
        "    {} messages, {} flows",
        conversation.len(),
        conversation.flows.len()
    );

    for issue in &issues {
        println!("{}", format_issue(issue, use_color));
    }

    println!();
    let (errors, warnings) = tally(&issues);
    if errors == 0 && warnings == 0 {
        println!("  Script looks good.");
    } else {
        let issue_word = if errors + warnings == 1 { "issue" } else { "issues" };
        println!(
            "  {} {issue_word} found ({errors} errors, {warnings} warnings).",
            errors + warnings
        );
    }
    println!();

    if errors > 0 { 1 } else { 0 }
}

fn tally(issues: &[ScriptIssue]) -> (usize, usize) {
    let errors = issues.iter().filter(|i| i.is_error()).count();
    (errors, issues.len() - errors)
}

fn format_issue(issue: &ScriptIssue, use_color: bool) -> String {
    let scope = issue.scope.to_string();
    match (issue.severity, use_color) {
        (Severity::Error, true) => {
            use colored::Colorize;
            format!("    {} {scope:<20} {}", "✗".red(), issue.message.red())
        }
        (Severity::Warning, true) => {
            use colored::Colorize;
            format!("    {} {scope:<20} {}", "!".yellow(), issue.message.yellow())
        }
        (Severity::Error, false) => format!("    [FAIL] {scope:<20} {}", issue.message),
        (Severity::Warning, false) => format!("    [WARN] {scope:<20} {}", issue.message),
    }
}
