use crate::model::{ModuleStatus, ScanResult};
use std::fmt::Write;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Account")]
    account: String,
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Module")]
    module: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

pub fn render_table(result: &ScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Scan completed at: {}",
        result.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out);

    let rows: Vec<FindingRow> = result
        .modules
        .iter()
        .flat_map(|module| {
            module.vulnerable.iter().map(move |package| FindingRow {
                module: truncate(module.reference.as_str(), 50),
                package: package.to_string(),
                account: package.owner_segment().unwrap_or("-").to_string(),
            })
        })
        .collect();

    if rows.is_empty() {
        let _ = writeln!(out, "No dependencies owned by deleted accounts.");
    } else {
        let _ = writeln!(
            out,
            "Found {} dependencies owned by deleted accounts:",
            rows.len()
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()).to_string());
    }

    let failures: Vec<FailureRow> = result
        .failed()
        .filter_map(|module| match &module.status {
            ModuleStatus::Failed { reason } => Some(FailureRow {
                module: truncate(module.reference.as_str(), 50),
                reason: truncate(first_line(reason), 80),
            }),
            ModuleStatus::Scanned => None,
        })
        .collect();

    if !failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Could not scan {} modules:", failures.len());
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", Table::new(failures).with(Style::rounded()).to_string());
    }

    let _ = writeln!(out);
    let _ = write!(out, "{}", summary(result));
    out
}

fn summary(result: &ScanResult) -> String {
    let scanned = result.scanned().count();
    let failed = result.modules.len() - scanned;
    let vulnerable = result.vulnerable_packages().len();

    if !result.is_conclusive() {
        format!(
            "\x1b[33mINCONCLUSIVE\x1b[0m: none of the {} modules could be scanned",
            failed
        )
    } else if vulnerable == 0 {
        format!(
            "\x1b[32mSafe\x1b[0m: {} modules scanned, {} failed",
            scanned, failed
        )
    } else {
        format!(
            "\x1b[31mVULNERABLE\x1b[0m: {} packages can be hijacked ({} modules scanned, {} failed)",
            vulnerable, scanned, failed
        )
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
