use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::ptr;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use cc_cli::progress::BarSink;
use cc_cli::summary::assessments_table;
use cc_cli::types::{AssessmentRow, RunReport};
use cc_convert::{
    ConvertOptions, NoProgress, ProgressSink, Reporter, convert_cartridge, convert_qti_file,
    convert_session, correlate, read_candidates,
};
use cc_ingest::{Cartridge, collect_assessments};
use cc_model::{Assessment, QuestionType};
use cc_render::FontMap;

use crate::cli::{AssessmentsArgs, ConvertArgs};

/// What `convert` was pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Session,
    Qti,
    Cartridge,
}

pub fn detect_input(path: &Path) -> InputKind {
    if path.is_dir() {
        InputKind::Session
    } else if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
    {
        InputKind::Qti
    } else {
        InputKind::Cartridge
    }
}

/// `<INPUT>/output` for a directory, else `<parent>/<stem>`.
pub fn default_output_dir(input: &Path, kind: InputKind) -> PathBuf {
    if kind == InputKind::Session {
        return input.join("output");
    }
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |stem| stem.to_os_string());
    parent.join(stem)
}

pub fn run_convert(args: &ConvertArgs) -> Result<RunReport> {
    let span = info_span!("convert", input = %args.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    let kind = detect_input(&args.input);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.input, kind));
    let options = build_options(args)?;
    let mut sink = BarSink::new(!args.no_progress && io::stderr().is_terminal());

    let report = match kind {
        InputKind::Session => {
            let outcome = convert_session(&args.input, &output_dir, &options, &mut sink)
                .with_context(|| format!("convert cartridges in {}", args.input.display()))?;
            RunReport::from_session(args.input.clone(), output_dir, outcome)
        }
        InputKind::Qti => {
            let outcome = convert_qti_file(&args.input, &output_dir, &options)
                .with_context(|| format!("convert {}", args.input.display()))?;
            let report = RunReport::from_qti(args.input.clone(), output_dir, outcome);
            sink.report(&report.message.0, Some(report.message.1));
            report
        }
        InputKind::Cartridge => {
            let outcome = convert_cartridge(&args.input, &output_dir, &options, &mut sink)
                .with_context(|| format!("convert {}", args.input.display()))?;
            RunReport::from_cartridge(args.input.clone(), outcome)
        }
    };
    sink.finish();

    info!(
        errors = report.summary.error_count(),
        warnings = report.summary.warning_count(),
        duration_ms = start.elapsed().as_millis(),
        "conversion finished"
    );
    Ok(report)
}

fn build_options(args: &ConvertArgs) -> Result<ConvertOptions> {
    let mut options = ConvertOptions::new().with_limit(args.limit);
    if let Some(path) = &args.font_map {
        let fonts = FontMap::from_json_file(path)
            .with_context(|| format!("load font map {}", path.display()))?;
        info!(fonts = fonts.len(), path = %path.display(), "loaded font map");
        options = options.with_fonts(fonts);
    }
    Ok(options)
}

pub fn run_assessments(args: &AssessmentsArgs) -> Result<()> {
    let cartridge = Cartridge::open(&args.cartridge)
        .with_context(|| format!("open cartridge {}", args.cartridge.display()))?;

    let mut sink = NoProgress;
    let mut reporter = Reporter::new(&mut sink);
    let assessments = collect_assessments(
        &cartridge.archive,
        &cartridge.manifest.resources,
        args.limit,
        reporter.summary_mut(),
    );
    let candidates = read_candidates(&cartridge.archive, &mut reporter);
    let correlation = correlate(&assessments, &candidates, &mut reporter);

    let rows: Vec<AssessmentRow> = assessments
        .iter()
        .map(|assessment| {
            let source = correlation
                .iter()
                .find(|(_, matched)| ptr::eq(*matched, assessment))
                .map(|(path, _)| path.to_string());
            assessment_row(assessment, source)
        })
        .collect();

    println!("Course: {}", cartridge.manifest.course_title);
    if rows.is_empty() {
        println!("No assessments found.");
    } else {
        println!("{}", assessments_table(&rows));
    }
    let summary = reporter.summary();
    if summary.error_count() + summary.warning_count() > 0 {
        eprintln!(
            "{} errors, {} warnings while reading assessments",
            summary.error_count(),
            summary.warning_count()
        );
    }
    Ok(())
}

fn assessment_row(assessment: &Assessment, source: Option<String>) -> AssessmentRow {
    let (mut multiple_choice, mut essay) = (0, 0);
    for item in assessment.items() {
        match item.question_type {
            QuestionType::MultipleChoice => multiple_choice += 1,
            QuestionType::Essay => essay += 1,
        }
    }
    AssessmentRow {
        title: assessment.title.clone(),
        ident: assessment.ident.clone(),
        multiple_choice,
        essay,
        source,
    }
}
