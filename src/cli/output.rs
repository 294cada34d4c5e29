//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying plans, apply
//! results and generation summaries in text or JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::DefinitionHasher;
use crate::generator::GenerateResult;
use crate::planner::{ActionType, DiffEntry, ExecutionResult, Plan};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Tracking id")]
    tracking_id: String,
    #[tabled(rename = "Changes")]
    changes: usize,
}

/// Applied action row for table display.
#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Tracking id")]
    tracking_id: String,
    #[tabled(rename = "Link")]
    link: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &Plan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(plan)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &Plan) -> String {
        if plan.is_empty() {
            return format!("{} No changes required, everything is up to date.\n", "✓".green());
        }

        let hasher = DefinitionHasher::new();
        let mut output = String::new();
        let _ = writeln!(output, "\nPlan");
        let _ = writeln!(
            output,
            "   Definitions: {} ({})\n",
            hasher.short_hash(&plan.fingerprint),
            plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let rows: Vec<PlanActionRow> = plan
            .changes()
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_action_type(a.action_type),
                kind: a.kind.to_string(),
                tracking_id: a.tracking_id.clone(),
                changes: a.diff.len(),
            })
            .collect();
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        for action in plan.changes().filter(|a| !a.diff.is_empty()) {
            let _ = writeln!(output, "\n{} {}", "~".yellow(), action.tracking_id.bold());
            for entry in action.diff.entries() {
                let _ = writeln!(output, "   {}", Self::format_diff_entry(entry));
            }
        }

        let _ = write!(
            output,
            "\nPlan: {} to create, {} to update, {} to delete\n",
            plan.count(ActionType::Create).to_string().green(),
            plan.count(ActionType::Update).to_string().yellow(),
            plan.count(ActionType::Delete).to_string().red()
        );

        output
    }

    /// Formats the result of applying a plan.
    #[must_use]
    pub fn format_execution(&self, result: &ExecutionResult) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&ExecutionJson::from(result)).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = format!("{} Plan applied\n\n", "✓".green());
                let rows: Vec<ResultRow> = result
                    .results
                    .iter()
                    .map(|r| ResultRow {
                        action: Self::format_action_type(r.action_type),
                        kind: r.kind.to_string(),
                        tracking_id: r.tracking_id.clone(),
                        link: r.url.clone().unwrap_or_default(),
                    })
                    .collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                output
            }
        }
    }

    /// Formats a generation summary.
    #[must_use]
    pub fn format_generate(&self, result: &GenerateResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!(
                    "{} Generated {} snapshots\n",
                    "✓".green(),
                    result.written.len() + result.unchanged
                );
                let _ = writeln!(output, "   Written: {}", result.written.len());
                let _ = writeln!(output, "   Unchanged: {}", result.unchanged);
                let _ = writeln!(output, "   Removed: {}", result.removed.len());
                output
            }
        }
    }

    /// Formats an action type with color.
    fn format_action_type(action_type: ActionType) -> String {
        match action_type {
            ActionType::Create => "+create".green().to_string(),
            ActionType::Update => "~update".yellow().to_string(),
            ActionType::Delete => "-delete".red().to_string(),
            ActionType::Noop => "noop".dimmed().to_string(),
        }
    }

    /// Formats a diff entry with color.
    fn format_diff_entry(entry: &DiffEntry) -> String {
        let text = entry.to_string();
        match entry {
            DiffEntry::Added { .. } => text.green().to_string(),
            DiffEntry::Removed { .. } => text.red().to_string(),
            DiffEntry::Changed { .. } => text.yellow().to_string(),
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct PlanJson<'a> {
    fingerprint: &'a str,
    created_at: String,
    creates: usize,
    updates: usize,
    deletes: usize,
    actions: Vec<ActionJson<'a>>,
}

#[derive(serde::Serialize)]
struct ActionJson<'a> {
    action: String,
    kind: String,
    tracking_id: &'a str,
    id: Option<&'a str>,
    diff: &'a [DiffEntry],
}

impl<'a> From<&'a Plan> for PlanJson<'a> {
    fn from(plan: &'a Plan) -> Self {
        Self {
            fingerprint: &plan.fingerprint,
            created_at: plan.created_at.to_rfc3339(),
            creates: plan.count(ActionType::Create),
            updates: plan.count(ActionType::Update),
            deletes: plan.count(ActionType::Delete),
            actions: plan
                .changes()
                .map(|a| ActionJson {
                    action: a.action_type.to_string(),
                    kind: a.kind.to_string(),
                    tracking_id: &a.tracking_id,
                    id: a.remote_id.as_ref().map(|id| id.as_str()),
                    diff: a.diff.entries(),
                })
                .collect(),
        }
    }
}

#[derive(serde::Serialize)]
struct ExecutionJson<'a> {
    applied: usize,
    results: Vec<ResultJson<'a>>,
}

#[derive(serde::Serialize)]
struct ResultJson<'a> {
    action: String,
    kind: String,
    tracking_id: &'a str,
    id: Option<&'a str>,
    url: Option<&'a str>,
}

impl<'a> From<&'a ExecutionResult> for ExecutionJson<'a> {
    fn from(result: &'a ExecutionResult) -> Self {
        Self {
            applied: result.results.len(),
            results: result
                .results
                .iter()
                .map(|r| ResultJson {
                    action: r.action_type.to_string(),
                    kind: r.kind.to_string(),
                    tracking_id: &r.tracking_id,
                    id: r.remote_id.as_ref().map(|id| id.as_str()),
                    url: r.url.as_deref(),
                })
                .collect(),
        }
    }
}
