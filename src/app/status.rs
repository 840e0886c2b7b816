use hitl_harness::store::{PatchStatus, ProjectSummary};
use hitl_harness::verify::duplicate_strategies;
use std::collections::BTreeMap;

pub fn render_state(project_id: &str, summary: &ProjectSummary) -> String {
    let mut lines = vec![
        format!("◆ Project {project_id}"),
        String::new(),
        format!(
            "  Strategy     v{} ({} versions)",
            summary
                .latest_version()
                .map_or_else(|| "-".to_string(), |v| v.to_string()),
            summary.strategies.len()
        ),
        format!("  Patches      {}", summary.patches.len()),
    ];

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for patch in &summary.patches {
        *by_status.entry(patch.status.to_string()).or_insert(0) += 1;
    }
    for (status, count) in &by_status {
        lines.push(format!("    {status:<12} {count}"));
    }

    lines.push(format!("  Campaigns    {}", summary.campaigns.len()));
    lines.push(format!("  Briefs       {}", summary.briefs.len()));
    lines.push(format!(
        "  Metrics      {} ({} with derived fields)",
        summary.metrics.len(),
        summary
            .metrics
            .iter()
            .filter(|m| m.has_derived_fields())
            .count()
    ));

    let duplicates = duplicate_strategies(&summary.campaigns);
    if duplicates.is_empty() {
        lines.push("  Duplicates   none".to_string());
    } else {
        lines.push(format!("  Duplicates   {}", duplicates.join(", ")));
    }

    let pending = by_status
        .get(&PatchStatus::Proposed.to_string())
        .copied()
        .unwrap_or(0);
    if pending > 0 {
        lines.push(String::new());
        lines.push(format!("  {pending} patch(es) awaiting review"));
    }

    lines.join("\n")
}
