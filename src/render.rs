// Plain-text presentation of collection results and reports.

use std::fmt;

use crate::models::{CollectionOutcome, CollectionResult, MissingSide, Report};

/// `1234567` -> `1 234 567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// `+230`, `-4 900`; empty for zero.
pub fn format_delta(delta: i64) -> String {
    match delta {
        0 => String::new(),
        d if d > 0 => format!("+{}", group_thousands(d.unsigned_abs())),
        d => format!("-{}", group_thousands(d.unsigned_abs())),
    }
}

fn with_delta(delta: i64) -> String {
    match format_delta(delta) {
        s if s.is_empty() => s,
        s => format!(" ({s})"),
    }
}

pub struct CollectionTable<'a>(pub &'a [CollectionResult]);

impl fmt::Display for CollectionTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan devices:")?;
        for result in self.0 {
            match &result.outcome {
                CollectionOutcome::Collected { counter, .. } => writeln!(
                    f,
                    "{:>20} : {:>10} {}",
                    result.device_name,
                    group_thousands(*counter),
                    result.description
                )?,
                CollectionOutcome::NoAnswer => {
                    writeln!(f, "{:>20} : No answer", result.device_name)?
                }
                CollectionOutcome::StoreFailed { counter, error } => writeln!(
                    f,
                    "{:>20} : {:>10} not archived: {}",
                    result.device_name,
                    group_thousands(*counter),
                    error
                )?,
            }
        }
        Ok(())
    }
}

pub struct ReportTable<'a>(pub &'a Report);

impl fmt::Display for ReportTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "Report {} .. {}:", report.start_date, report.end_date)?;
        for entry in &report.entries {
            writeln!(
                f,
                "{:>20}: {:>10}{}",
                entry.device_name,
                group_thousands(entry.end_counter),
                with_delta(entry.delta)
            )?;
        }
        writeln!(
            f,
            "Total page: {}{}",
            group_thousands(report.total_end),
            with_delta(report.total_delta)
        )?;

        writeln!(f, "Groups:")?;
        for group in &report.groups {
            writeln!(
                f,
                "{:>20}: {:>10}{}",
                group.group_name,
                group_thousands(group.end_total),
                with_delta(group.delta)
            )?;
        }

        if !report.incomplete.is_empty() {
            writeln!(f, "Incomplete range:")?;
            for entry in &report.incomplete {
                let reason = match entry.missing {
                    MissingSide::Start => "no baseline",
                    MissingSide::End => "no end snapshot",
                    MissingSide::Both => "no snapshots",
                };
                match entry.counter {
                    Some(counter) => writeln!(
                        f,
                        "{:>20}: {:>10} ({reason})",
                        entry.device_name,
                        group_thousands(counter)
                    )?,
                    None => writeln!(f, "{:>20}: {:>10} ({reason})", entry.device_name, "-")?,
                }
            }
        }

        if !report.unknown_devices.is_empty() {
            writeln!(
                f,
                "Not in configuration: {}",
                report.unknown_devices.join(", ")
            )?;
        }
        Ok(())
    }
}

pub struct DatesTable<'a>(pub &'a [(chrono::NaiveDate, u64)]);

impl fmt::Display for DatesTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "Archive is empty");
        }
        for (date, snapshots) in self.0 {
            writeln!(f, "{date}: {snapshots} device(s)")?;
        }
        Ok(())
    }
}
