use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use cc_model::{ConversionSummary, Issue, IssueKind, IssueSeverity};

use crate::types::{AssessmentRow, RunKind, RunReport};

/// Issue counts for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCount {
    pub errors: usize,
    pub warnings: usize,
}

/// Errors and warnings per issue kind, ordered by kind name.
pub fn kind_counts(summary: &ConversionSummary) -> BTreeMap<&'static str, KindCount> {
    let mut counts: BTreeMap<&'static str, KindCount> = BTreeMap::new();
    for issue in &summary.errors {
        counts.entry(issue.kind.as_str()).or_default().errors += 1;
    }
    for issue in &summary.warnings {
        counts.entry(issue.kind.as_str()).or_default().warnings += 1;
    }
    counts
}

pub fn print_summary(report: &RunReport) {
    println!("Input: {}", report.input.display());
    println!("Output: {}", report.output_dir.display());
    match &report.kind {
        RunKind::Cartridge => {}
        RunKind::Session { cartridges } => {
            println!("Cartridges: {}", cartridges.join(", "));
        }
        RunKind::Qti => {
            for document in &report.documents {
                println!("Document: {}", document.display());
            }
        }
    }

    let counts = kind_counts(&report.summary);
    if !counts.is_empty() {
        println!("{}", counts_table(&counts));
    }
    print_issue_table(&report.summary);
    if let Some(error) = &report.summary.hierarchy_error {
        eprintln!("Hierarchy: {error}");
    }
    for failure in &report.hierarchy_failures {
        match &failure.cartridge {
            Some(name) => eprintln!("Hierarchy ({name}): {}", failure.error),
            None => eprintln!("Combined hierarchy: {}", failure.error),
        }
    }
    println!("{}", report.message.0);
}

fn counts_table(counts: &BTreeMap<&'static str, KindCount>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Issue"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut total = KindCount::default();
    for (kind, count) in counts {
        total.errors += count.errors;
        total.warnings += count.warnings;
        table.add_row(vec![
            Cell::new(kind),
            count_cell(count.errors, Color::Red),
            count_cell(count.warnings, Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        count_cell(total.errors, Color::Red).add_attribute(Attribute::Bold),
        count_cell(total.warnings, Color::Yellow).add_attribute(Attribute::Bold),
    ]);
    table
}

fn print_issue_table(summary: &ConversionSummary) {
    let issues: Vec<(IssueSeverity, &Issue)> = summary
        .errors
        .iter()
        .map(|issue| (IssueSeverity::Error, issue))
        .chain(
            summary
                .warnings
                .iter()
                .map(|issue| (IssueSeverity::Warning, issue)),
        )
        .collect();
    if issues.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Kind"),
        header_cell("File"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for (severity, issue) in issues {
        table.add_row(vec![
            severity_cell(severity),
            kind_cell(issue.kind),
            issue
                .file_path
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

/// Table of the assessments found in a cartridge.
pub fn assessments_table(rows: &[AssessmentRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Title"),
        header_cell("Ident"),
        header_cell("Items"),
        header_cell("MC"),
        header_cell("Essay"),
        header_cell("Source"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.title)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            dim_cell(&row.ident),
            Cell::new(row.item_count()),
            count_cell(row.multiple_choice, Color::Green),
            count_cell(row.essay, Color::Green),
            row.source
                .as_deref()
                .map_or_else(|| Cell::new("unmatched").fg(Color::Yellow), Cell::new),
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Fixed(9)),
        ColumnConstraint::UpperBoundary(Width::Fixed(26)),
        ColumnConstraint::UpperBoundary(Width::Percentage(35)),
        ColumnConstraint::UpperBoundary(Width::Percentage(50)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR").fg(Color::Red),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn kind_cell(kind: IssueKind) -> Cell {
    match kind {
        IssueKind::Cartridge | IssueKind::AssessmentParse => Cell::new(kind)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        _ => Cell::new(kind),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
