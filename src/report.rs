//! Plain-text, JSON and CSV renderings of an [`AnalysisReport`]
//!
//! The report itself carries no presentation logic; these functions only
//! format it. NaN cells render as `NaN` in text, `null` in JSON and an empty
//! field in CSV.

use crate::aggregate::Summary;
use crate::error::Result;
use crate::labels::{Category, Condition, Phase};
use crate::pipeline::AnalysisReport;
use std::fmt::Write as _;

/// Long-format summary record: one row per (table, phase, condition)
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SummaryRecord {
    pub table: &'static str,
    pub phase: Option<&'static str>,
    pub condition: &'static str,
    pub mean: Option<f64>,
    pub sem: Option<f64>,
    pub n: usize,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn by_condition(table: &'static str, summary: &Summary<Condition>) -> Vec<SummaryRecord> {
    summary
        .rows
        .iter()
        .map(|r| SummaryRecord {
            table,
            phase: None,
            condition: r.key.label(),
            mean: finite(r.mean),
            sem: finite(r.sem),
            n: r.n,
        })
        .collect()
}

/// Flatten every summary table in the report into long-format records
pub fn summary_records(report: &AnalysisReport) -> Vec<SummaryRecord> {
    let mut records: Vec<SummaryRecord> = report
        .accuracy_by_phase
        .rows
        .iter()
        .map(|r| SummaryRecord {
            table: "accuracy_by_phase",
            phase: Some(r.key.0.label()),
            condition: r.key.1.label(),
            mean: finite(r.mean),
            sem: finite(r.sem),
            n: r.n,
        })
        .collect();

    records.extend(by_condition("accuracy", &report.accuracy_by_condition));
    records.extend(by_condition("verbal_fluency", &report.fluency_by_condition));

    if let Some(derived) = &report.derived {
        records.extend(by_condition("creative_diff", &derived.creative_diff));
        records.extend(by_condition("pre_ai_feel", &derived.pre_ai_feel));
        records.extend(by_condition("post_ai_feel", &derived.post_ai_feel));
        records.extend(by_condition("feel_diff", &derived.feel_diff));
        records.extend(by_condition("difficulty", &derived.difficulty));
        records.extend(by_condition("helpful", &derived.helpful));
    }

    records
}

/// All summary tables as one CSV document
pub fn render_summary_csv(report: &AnalysisReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in summary_records(report) {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Pretty-printed JSON
pub fn render_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn fmt_num(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn fmt_p(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value < 1e-4 {
        "<0.0001".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn write_condition_table(out: &mut String, title: &str, summary: &Summary<Condition>) {
    let _ = writeln!(out, "{}:", title);
    let _ = writeln!(out, "  {:<14} {:>10} {:>10} {:>6}", "condition", "mean", "sem", "n");
    for r in &summary.rows {
        let _ = writeln!(
            out,
            "  {:<14} {:>10} {:>10} {:>6}",
            r.key.label(),
            fmt_num(r.mean),
            fmt_num(r.sem),
            r.n
        );
    }
    out.push('\n');
}

/// Human-readable summary, in pipeline stage order
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let s = &report.screening;

    let _ = writeln!(out, "convergent {}", report.version);
    let _ = writeln!(out, "=== Screening ===");
    let _ = writeln!(
        out,
        "participants: {} retained of {} ({} failed attention check)",
        s.participants_retained,
        s.participants_total,
        s.excluded.len()
    );
    let _ = writeln!(
        out,
        "responses: {} retained of {}\n",
        s.responses_retained, s.responses_total
    );

    let b = &report.balance;
    let _ = writeln!(out, "=== Randomization ===");
    let _ = writeln!(
        out,
        "group sizes {:?}: chi2({}) = {}, p = {}\n",
        b.group_sizes,
        b.df,
        fmt_num(b.statistic),
        fmt_p(b.pvalue)
    );

    let _ = writeln!(out, "=== Accuracy ===");
    let _ = writeln!(
        out,
        "  {:<10} {:<14} {:>10} {:>10} {:>6}",
        "phase", "condition", "mean", "sem", "n"
    );
    for r in &report.accuracy_by_phase.rows {
        let (phase, condition): (Phase, Condition) = r.key;
        let _ = writeln!(
            out,
            "  {:<10} {:<14} {:>10} {:>10} {:>6}",
            phase.label(),
            condition.label(),
            fmt_num(r.mean),
            fmt_num(r.sem),
            r.n
        );
    }
    out.push('\n');
    write_condition_table(
        &mut out,
        &format!("{} phase accuracy", report.analysis_phase.label()),
        &report.accuracy_by_condition,
    );
    write_condition_table(&mut out, "verbal fluency", &report.fluency_by_condition);

    if let Some(d) = &report.derived {
        let _ = writeln!(out, "=== Derived metrics ===");
        write_condition_table(&mut out, "creative_diff", &d.creative_diff);
        write_condition_table(&mut out, "feel_diff", &d.feel_diff);
        write_condition_table(&mut out, "difficulty", &d.difficulty);
        write_condition_table(&mut out, "helpful", &d.helpful);
    }

    if let Some(anova) = &report.anova {
        let _ = writeln!(out, "=== ANCOVA (sequential SS) ===");
        let _ = writeln!(
            out,
            "  {:<16} {:>4} {:>10} {:>10} {:>10} {:>10}",
            "term", "df", "sum_sq", "mean_sq", "F", "p"
        );
        for row in &anova.rows {
            let _ = writeln!(
                out,
                "  {:<16} {:>4} {:>10} {:>10} {:>10} {:>10}",
                row.term,
                row.df,
                fmt_num(row.sum_sq),
                fmt_num(row.mean_sq),
                row.f_value.map(fmt_num).unwrap_or_default(),
                row.p_value.map(fmt_p).unwrap_or_default()
            );
        }
        out.push('\n');
    }

    if let Some(hsd) = &report.posthoc {
        let _ = writeln!(
            out,
            "=== Tukey HSD ({:.0}% family-wise, k = {}, df = {}) ===",
            hsd.confidence_level * 100.0,
            hsd.family_size,
            hsd.residual_df
        );
        for r in &hsd.results {
            let _ = writeln!(
                out,
                "  {:<28} {:>9} [{}, {}] p = {}{}",
                r.contrast,
                fmt_num(r.estimate),
                fmt_num(r.lower),
                fmt_num(r.upper),
                fmt_p(r.p_adjusted),
                if r.significant { " *" } else { "" }
            );
        }
        out.push('\n');
    }

    for failure in &report.stage_failures {
        let _ = writeln!(out, "FAILED {}: {}", failure.stage, failure.message);
    }

    out
}
