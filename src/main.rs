use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use rams_pdf::{GenerateOptions, ReportKind, render_json_file};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Rams,
    MethodStatement,
}

impl From<Kind> for ReportKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Rams => ReportKind::Rams,
            Kind::MethodStatement => ReportKind::MethodStatement,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Generate a RAMS or method statement PDF from JSON report data")]
struct Args {
    /// Input JSON file
    input: PathBuf,

    /// Output PDF file (defaults to input with .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "rams")]
    kind: Kind,

    /// Risk table rows per page chunk (0 disables chunking)
    #[arg(long, default_value_t = 8)]
    rows_per_page: usize,

    /// Minimum rows in the worker sign-on table
    #[arg(long, default_value_t = 10)]
    sign_on_rows: usize,

    /// Leave out the contents page
    #[arg(long)]
    no_contents: bool,

    /// Company name for the title page and header band
    #[arg(long)]
    company: Option<String>,

    /// TrueType font for body text (overrides RAMS_PDF_FONT)
    #[arg(long)]
    font: Option<PathBuf>,

    /// TrueType font for bold text (overrides RAMS_PDF_BOLD_FONT)
    #[arg(long)]
    bold_font: Option<PathBuf>,

    /// Fail when a residual risk rating exceeds the initial rating
    #[arg(long)]
    strict_residual: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("pdf"));

    let options = GenerateOptions {
        rows_per_table_page: args.rows_per_page,
        sign_on_rows: args.sign_on_rows,
        include_contents_page: !args.no_contents,
        company_name: args.company,
        font: args.font,
        bold_font: args.bold_font,
        strict_residual: args.strict_residual,
        ..GenerateOptions::for_kind(args.kind.into())
    }
    .with_env_fonts();

    match render_json_file(&args.input, &output, &options) {
        Ok(report) => println!(
            "Wrote {} ({} pages)",
            output.display(),
            report.page_count
        ),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
