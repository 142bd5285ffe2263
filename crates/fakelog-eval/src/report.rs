use crate::model::{BatchProfile, DistributionReport};

/// Render a deterministic markdown report for a comparison.
pub fn render_report(report: &DistributionReport) -> String {
    let mut lines = Vec::new();

    lines.push("# Fakelog Distribution Report".to_string());
    lines.push(String::new());
    lines.push("## Row counts".to_string());
    lines.push(format!("- old: {}", report.old.rows));
    lines.push(format!("- new: {}", report.new.rows));
    lines.push(format!("- delta: {:+}", report.row_count_delta));
    lines.push(String::new());

    lines.push("## Outcome distribution".to_string());
    lines.push("| outcome | old % | new % | delta pp |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for (outcome, old) in report.old.outcome_percentages.iter() {
        lines.push(format!(
            "| {} | {:.2} | {:.2} | {:+.2} |",
            outcome,
            old,
            report.new.outcome_percentages.get(outcome),
            report.percentage_deltas.get(outcome)
        ));
    }
    lines.push(String::new());

    lines.push("## Outcome counts".to_string());
    lines.push("| outcome | old | new | change |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for delta in &report.outcome_deltas {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            delta.category, delta.old, delta.new, delta.change
        ));
    }
    lines.push(String::new());

    lines.push("## Priority counts".to_string());
    lines.push("| priority | old | new | change |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for delta in &report.priority_deltas {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            delta.category, delta.old, delta.new, delta.change
        ));
    }
    lines.push(String::new());

    lines.push("## Durations".to_string());
    lines.push("| batch | sum | mean |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    push_duration_row(&mut lines, "old", &report.old);
    push_duration_row(&mut lines, "new", &report.new);
    lines.push(String::new());

    lines.push("## Observations".to_string());
    for observation in &report.observations {
        lines.push(format!("- {observation}"));
    }
    lines.join("\n")
}

fn push_duration_row(lines: &mut Vec<String>, name: &str, profile: &BatchProfile) {
    lines.push(format!(
        "| {} | {:.2} | {:.2} |",
        name, profile.duration_sum, profile.duration_mean
    ));
}
