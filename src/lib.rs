mod error;
mod fonts;
mod model;
mod options;
mod pdf;
mod pipeline;
mod risk;
mod steps;

pub use error::Error;
pub use model::{
    EmergencyArrangements, MethodStep, NOT_SPECIFIED, PpeItem, ProjectInfo, RamsData, RiskEntry,
    Signatory, Worker,
};
pub use options::{BOLD_FONT_ENV, FONT_ENV, GenerateOptions, PageGeometry, ReportKind};
pub use pdf::table::chunk_rows;
pub use pdf::{PageSummary, Report, TocEntry};
pub use pipeline::{Pipeline, SectionId, SectionSpec};
pub use risk::{MAX_FACTOR, MAX_RATING, MIN_FACTOR, RiskBand, RiskLevel, RiskRating};
pub use steps::StepGraph;

use std::path::Path;
use std::time::Instant;

/// Builds the report with the standard section list for `options.kind`.
pub fn generate(data: &RamsData, options: &GenerateOptions) -> Result<Report, Error> {
    generate_with_pipeline(data, options, &Pipeline::for_kind(options.kind))
}

/// Sanitizes `data`, validates method steps and lays out every section of
/// `pipeline` in order. Any error aborts the whole report.
pub fn generate_with_pipeline(
    data: &RamsData,
    options: &GenerateOptions,
    pipeline: &Pipeline,
) -> Result<Report, Error> {
    let t0 = Instant::now();

    let mut options = options.clone();
    let generated_at = options.timestamp();
    options.generated_at = Some(generated_at);

    let clean = data.sanitized(generated_at.date_naive(), options.strict_residual)?;
    StepGraph::build(&clean.steps)?;
    let t_validate = t0.elapsed();

    let report = pdf::render(&clean, &options, pipeline)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: validate={:.1}ms, render={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_validate.as_secs_f64() * 1000.0,
        (t_total - t_validate).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.page_count,
        report.bytes.len(),
    );

    Ok(report)
}

/// Reads `RamsData` JSON from `input` and writes the PDF to `output`.
pub fn render_json_file(input: &Path, output: &Path, options: &GenerateOptions) -> Result<Report, Error> {
    let t0 = Instant::now();

    let text = std::fs::read_to_string(input)?;
    let data: RamsData = serde_json::from_str(&text)?;
    let t_parse = t0.elapsed();

    let report = generate(&data, options)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &report.bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.bytes.len(),
    );

    Ok(report)
}
