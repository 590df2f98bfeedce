//! Output rendering for analysis reports.
//!
//! Supports `human` (default) and `json` outputs. Human output is built from
//! styled segments so rendering stays a pure function of the report; colors
//! are applied only at print time.

use crate::report::{Report, ReportEntry};
use crate::scan::SkippedFile;
use owo_colors::{AnsiColors, OwoColorize};
use serde_json::json;
use serde_json::Value as JsonVal;

/// Version colors, cycled by group index.
pub const PALETTE: [AnsiColors; 6] = [
    AnsiColors::Green,
    AnsiColors::Red,
    AnsiColors::Yellow,
    AnsiColors::Blue,
    AnsiColors::Cyan,
    AnsiColors::Magenta,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Label,
    Name,
    /// Version text; the value is the version's group index.
    Version(usize),
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

impl Segment {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Segment {
            text: text.into(),
            style,
        }
    }

    fn paint(&self, color: bool) -> String {
        if !color {
            return self.text.clone();
        }
        match self.style {
            Style::Label => self.text.bright_white().to_string(),
            Style::Name => self.text.white().to_string(),
            Style::Version(group) => self.text.color(version_color(group)).to_string(),
            Style::Plain => self.text.clone(),
        }
    }
}

pub fn version_color(group: usize) -> AnsiColors {
    PALETTE[group % PALETTE.len()]
}

fn use_colors(output: &str) -> bool {
    output != "json" && crate::utils::use_colors()
}

/// Segments for one entry: header line, one line per request, blank line.
pub fn render_entry(entry: &ReportEntry) -> Vec<Segment> {
    let mut out = vec![
        Segment::new("Reference: ", Style::Label),
        Segment::new(entry.name.clone(), Style::Name),
        Segment::new("\n", Style::Plain),
    ];
    for line in &entry.lines {
        out.push(Segment::new(
            format!("   {}", line.version),
            Style::Version(line.group),
        ));
        out.push(Segment::new(" by ", Style::Label));
        out.push(Segment::new(line.requested_by.clone(), Style::Name));
        out.push(Segment::new("\n", Style::Plain));
    }
    out.push(Segment::new("\n", Style::Plain));
    out
}

/// Full human-readable report text.
pub fn render_human(report: &Report, color: bool) -> String {
    let mut s = String::new();
    s.push_str("Checking assemblies in:\n");
    s.push_str(&report.directory);
    s.push_str("\n\n");
    if report.only_conflicts {
        s.push_str("Detailing only conflicting assembly references.\n");
    }
    for entry in &report.entries {
        for seg in render_entry(entry) {
            s.push_str(&seg.paint(color));
        }
    }
    s
}

/// Print a report in the requested format.
pub fn print_report(report: &Report, output: &str) {
    match output {
        "json" => println!("{:#}", compose_report_json(report)),
        _ => print!("{}", render_human(report, use_colors(output))),
    }
}

/// Print the per-file diagnostics gathered while scanning (human mode only).
pub fn print_skipped(skipped: &[SkippedFile], output: &str) {
    if output == "json" {
        return;
    }
    for sk in skipped {
        if sk.native {
            eprintln!(
                "{} Skipping '{}': {}",
                crate::utils::note_prefix(),
                sk.file,
                sk.reason
            );
        } else {
            eprintln!(
                "{} Failed to load assembly '{}': {}",
                crate::utils::warn_prefix(),
                sk.file,
                sk.reason
            );
        }
    }
}

/// Print the "nothing to analyze" outcome.
pub fn print_nothing_found(
    directory: &str,
    candidates: usize,
    skipped: &[SkippedFile],
    output: &str,
) {
    match output {
        "json" => println!(
            "{:#}",
            compose_nothing_found_json(directory, candidates, skipped)
        ),
        _ => println!("{}", nothing_found_message(directory, candidates)),
    }
}

pub fn nothing_found_message(directory: &str, candidates: usize) -> String {
    if candidates == 0 {
        format!("No dll files found in directory: '{}'", directory)
    } else {
        format!(
            "No readable assemblies found in directory: '{}' ({} candidate files skipped)",
            directory, candidates
        )
    }
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report) -> JsonVal {
    let conflicts = report.entries.iter().filter(|e| e.conflicting).count();
    json!({
        "status": "ok",
        "directory": report.directory,
        "onlyConflicts": report.only_conflicts,
        "entries": report.entries,
        "skipped": report.skipped,
        "summary": {
            "modules": report.modules,
            "references": report.entries.len(),
            "conflicts": conflicts,
            "skipped": report.skipped.len(),
        },
    })
}

pub fn compose_nothing_found_json(
    directory: &str,
    candidates: usize,
    skipped: &[SkippedFile],
) -> JsonVal {
    json!({
        "status": "nothing-found",
        "directory": directory,
        "message": nothing_found_message(directory, candidates),
        "candidates": candidates,
        "skipped": skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Version;
    use crate::report::ReportLine;

    fn entry() -> ReportEntry {
        let v1 = Version::new(1, 0, 0, 0);
        let v2 = Version::new(2, 0, 0, 0);
        ReportEntry {
            name: "Lib".into(),
            conflicting: true,
            versions: vec![v1, v2],
            lines: vec![
                ReportLine {
                    version: v1,
                    requested_by: "M1".into(),
                    group: 0,
                },
                ReportLine {
                    version: v2,
                    requested_by: "M2".into(),
                    group: 1,
                },
                ReportLine {
                    version: v1,
                    requested_by: "M3".into(),
                    group: 0,
                },
            ],
        }
    }

    fn report(entries: Vec<ReportEntry>) -> Report {
        Report {
            directory: "/out/bin".into(),
            only_conflicts: true,
            modules: 3,
            entries,
            skipped: vec![SkippedFile {
                file: "/out/bin/bad.dll".into(),
                reason: "not a PE image".into(),
                native: false,
            }],
        }
    }

    #[test]
    fn test_render_human_plain_text() {
        let text = render_human(&report(vec![entry()]), false);
        assert_eq!(
            text,
            "Checking assemblies in:\n/out/bin\n\n\
             Detailing only conflicting assembly references.\n\
             Reference: Lib\n   1.0.0.0 by M1\n   2.0.0.0 by M2\n   1.0.0.0 by M3\n\n"
        );
    }

    #[test]
    fn test_same_version_shares_style() {
        let segs = render_entry(&entry());
        let styles: Vec<_> = segs
            .iter()
            .filter_map(|s| match s.style {
                Style::Version(g) => Some(g),
                _ => None,
            })
            .collect();
        assert_eq!(styles, vec![0, 1, 0]);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(PALETTE.len(), 6);
        assert_eq!(version_color(0), version_color(6));
        assert_ne!(version_color(0), version_color(1));
    }

    #[test]
    fn test_colored_output_contains_escape_codes() {
        let text = render_human(&report(vec![entry()]), true);
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("Lib"));
    }

    #[test]
    fn test_json_mode_never_colors() {
        assert!(!use_colors("json"));
        let text = render_human(&report(vec![entry()]), use_colors("json"));
        assert!(!text.contains('\u{1b}'));
        assert_eq!(text, render_human(&report(vec![entry()]), false));
    }

    #[test]
    fn test_compose_report_json_shape() {
        let out = compose_report_json(&report(vec![entry()]));
        assert_eq!(out["status"], "ok");
        assert_eq!(out["summary"]["conflicts"], 1);
        assert_eq!(out["summary"]["skipped"], 1);
        assert_eq!(out["entries"][0]["name"], "Lib");
        assert_eq!(out["entries"][0]["lines"][1]["version"], "2.0.0.0");
        assert_eq!(out["entries"][0]["lines"][1]["requested_by"], "M2");
        assert_eq!(out["entries"][0]["lines"][2]["group"], 0);
    }

    #[test]
    fn test_nothing_found_variants() {
        assert!(nothing_found_message("/d", 0).starts_with("No dll files found"));
        let out = compose_nothing_found_json("/d", 2, &[]);
        assert_eq!(out["status"], "nothing-found");
        assert_eq!(out["candidates"], 2);
    }
}
