//! Leak report export.
//!
//! Summarizes the leak collection for hand-off to other tools: counts by
//! status and severity, the combined hourly cost of open leaks, and every
//! record with its accrued cost.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use leakwatch_sdk::{round_cents, StoredLeak};
use leakwatch_types::{EpochMillis, LeakRecord, Severity};
use serde::Serialize;

use super::duration::format_duration;

/// Counts and totals over all exported records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub active: usize,
    pub resolved: usize,
    /// Active records per severity band.
    pub by_severity: BTreeMap<String, usize>,
    /// Combined hourly cost of every active leak.
    pub active_cost_per_hour: f64,
}

/// One exported record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub id: String,
    #[serde(flatten)]
    pub record: LeakRecord,
    /// Human-readable time the leak has been (or was) running.
    pub running_for: String,
    pub accrued_cost: f64,
}

/// A snapshot of the leak collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakReport {
    pub generated_at: EpochMillis,
    pub summary: ReportSummary,
    pub leaks: Vec<ReportEntry>,
}

impl LeakReport {
    /// Build a report from stored records as of `now`.
    pub fn build(leaks: Vec<StoredLeak>, now: EpochMillis) -> Self {
        let mut by_severity: BTreeMap<String, usize> = Severity::ALL
            .iter()
            .filter(|s| s.is_reportable())
            .map(|s| (s.as_str().to_string(), 0))
            .collect();

        let mut active = 0;
        let mut active_cost = 0.0;
        for leak in leaks.iter().filter(|l| l.record.is_active()) {
            active += 1;
            active_cost += leak.record.cost_per_hour;
            *by_severity
                .entry(leak.record.severity.as_str().to_string())
                .or_default() += 1;
        }

        let total = leaks.len();
        let entries = leaks
            .into_iter()
            .map(|leak| {
                let end = leak.record.end_time.unwrap_or(now);
                ReportEntry {
                    running_for: format_duration(leak.record.start_time.elapsed_until(end)),
                    accrued_cost: round_cents(leak.record.accrued_cost(now)),
                    id: leak.id,
                    record: leak.record,
                }
            })
            .collect();

        Self {
            generated_at: now,
            summary: ReportSummary {
                total,
                active,
                resolved: total - active,
                by_severity,
                active_cost_per_hour: round_cents(active_cost),
            },
            leaks: entries,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leakwatch_types::LeakStatus;
    use std::time::Duration;

    fn leak(id: &str, severity: Severity, cost: f64, end: Option<u64>) -> StoredLeak {
        StoredLeak {
            id: id.to_string(),
            record: LeakRecord {
                asset_id: format!("asset-{}", id),
                asset_name: String::new(),
                network_id: "net-1".into(),
                start_time: EpochMillis::from_secs(0),
                current_lpm: 10.0,
                current_pressure: 6.0,
                cost_per_hour: cost,
                duration_minutes: 6,
                status: if end.is_some() {
                    LeakStatus::Resolved
                } else {
                    LeakStatus::Active
                },
                severity,
                created_at: EpochMillis::from_secs(300),
                last_update: EpochMillis::from_secs(360),
                end_time: end.map(EpochMillis::from_secs),
            },
        }
    }

    #[test]
    fn summary_counts_active_only_by_severity() {
        let now = EpochMillis::from_secs(7_200);
        let report = LeakReport::build(
            vec![
                leak("a", Severity::Moderate, 0.4, None),
                leak("b", Severity::Severe, 1.25, None),
                leak("c", Severity::Severe, 9.0, Some(3_600)),
            ],
            now,
        );

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.active, 2);
        assert_eq!(report.summary.resolved, 1);
        assert_eq!(report.summary.by_severity["moderate"], 1);
        assert_eq!(report.summary.by_severity["critical"], 0);
        assert_eq!(report.summary.by_severity["severe"], 1);
        assert_eq!(report.summary.active_cost_per_hour, 1.65);
    }

    #[test]
    fn entries_carry_accrued_cost() {
        let now = EpochMillis::from_secs(7_200);
        let report = LeakReport::build(
            vec![
                leak("a", Severity::Moderate, 0.4, None),
                leak("c", Severity::Severe, 9.0, Some(3_600)),
            ],
            now,
        );

        assert_eq!(report.leaks[0].accrued_cost, 0.8);
        assert_eq!(report.leaks[0].running_for, format_duration(Duration::from_secs(7_200)));
        assert_eq!(report.leaks[1].accrued_cost, 9.0);
        assert_eq!(report.leaks[1].running_for, "1h00m");
    }

    #[test]
    fn written_report_is_flat_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = LeakReport::build(
            vec![leak("a", Severity::Critical, 0.4, None)],
            EpochMillis::from_secs(600),
        );
        report.write_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["leaks"][0]["id"], "a");
        assert_eq!(value["leaks"][0]["assetId"], "asset-a");
        assert_eq!(value["leaks"][0]["severity"], "critical");
    }

    #[test]
    fn empty_collection() {
        let report = LeakReport::build(Vec::new(), EpochMillis::from_secs(1));
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.active_cost_per_hour, 0.0);
        assert!(report.leaks.is_empty());
    }
}
