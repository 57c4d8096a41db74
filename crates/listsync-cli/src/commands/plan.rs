//! Plan command - Preview the update steps of every entry
//!
//! Runs the same step planner as `listsync sync` but never talks to
//! AniList, so no token is needed.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use listsync_core::domain::entry::SyncEntry;
use listsync_sync::strategy::{PlanStrategy, StepPlanner};

use super::batch::load_entries;
use super::CommandContext;

#[derive(Debug, Args)]
pub struct PlanCommand {
    /// JSON file with the entries to inspect
    #[arg(long)]
    pub entries: PathBuf,

    /// Plan with incremental updates enabled
    #[arg(long)]
    pub incremental: bool,
}

/// What would happen to one entry
#[derive(Debug, Clone, PartialEq)]
enum PlannedAction {
    Invalid(String),
    Skip,
    Steps(Vec<String>),
}

fn describe(entry: &SyncEntry, planner: &dyn PlanStrategy) -> PlannedAction {
    if let Err(e) = entry.validate() {
        return PlannedAction::Invalid(e.to_string());
    }
    let plan = planner.plan(entry);
    if plan.is_empty() {
        PlannedAction::Skip
    } else {
        PlannedAction::Steps(plan.iter().map(ToString::to_string).collect())
    }
}

impl PlanCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let sync = &ctx.config.sync;
        let planner = StepPlanner::new(
            self.incremental || sync.incremental,
            sync.preserve_completed_status,
        );

        let entries = load_entries(&self.entries)?;
        let planned: Vec<_> = entries
            .iter()
            .map(|entry| (entry, describe(entry, &planner)))
            .collect();

        if ctx.format.is_json() {
            let json: Vec<serde_json::Value> = planned
                .iter()
                .map(|(entry, action)| {
                    let (kind, steps, error) = match action {
                        PlannedAction::Invalid(e) => ("invalid", Vec::new(), Some(e.as_str())),
                        PlannedAction::Skip => ("skip", Vec::new(), None),
                        PlannedAction::Steps(steps) if steps.len() > 1 => {
                            ("incremental", steps.clone(), None)
                        }
                        PlannedAction::Steps(steps) => ("direct", steps.clone(), None),
                    };
                    serde_json::json!({
                        "mediaId": entry.media_id,
                        "title": entry.title,
                        "action": kind,
                        "steps": steps,
                        "error": error,
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!(json));
            return Ok(());
        }

        let mut requests = 0;
        formatter.success(&format!(
            "Plan for {} entr{} (incremental: {})",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            planner.incremental()
        ));
        for (entry, action) in &planned {
            match action {
                PlannedAction::Invalid(e) => {
                    formatter.info(&format!("{}: invalid ({})", entry.display_name(), e));
                }
                PlannedAction::Skip => {
                    formatter.info(&format!(
                        "{}: skip (completed remotely)",
                        entry.display_name()
                    ));
                }
                PlannedAction::Steps(steps) => {
                    requests += steps.len();
                    formatter.info(&format!(
                        "{}: {} step{}",
                        entry.display_name(),
                        steps.len(),
                        if steps.len() == 1 { "" } else { "s" }
                    ));
                    for (i, step) in steps.iter().enumerate() {
                        formatter.info(&format!("    {}. {}", i + 1, step));
                    }
                }
            }
        }
        formatter.info("");
        formatter.info(&format!("Requests: {}", requests));

        Ok(())
    }
}
