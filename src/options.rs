use std::path::PathBuf;

use chrono::{DateTime, Utc};

pub const FONT_ENV: &str = "RAMS_PDF_FONT";
pub const BOLD_FONT_ENV: &str = "RAMS_PDF_BOLD_FONT";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportKind {
    #[default]
    Rams,
    MethodStatement,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Rams => "Risk Assessment & Method Statement",
            ReportKind::MethodStatement => "Method Statement",
        }
    }

    pub fn short_title(self) -> &'static str {
        match self {
            ReportKind::Rams => "RAMS",
            ReportKind::MethodStatement => "Method Statement",
        }
    }
}

/// Page box in points. Y is measured downward from the top edge of the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Space reserved below the top margin for the header band.
    pub header_offset: f32,
    /// Space reserved above the bottom margin for the footer band.
    pub footer_height: f32,
}

impl PageGeometry {
    pub const fn a4() -> Self {
        PageGeometry {
            width: 595.28,
            height: 841.89,
            margin: 36.0,
            header_offset: 28.0,
            footer_height: 30.0,
        }
    }

    pub const fn letter() -> Self {
        PageGeometry {
            width: 612.0,
            height: 792.0,
            ..PageGeometry::a4()
        }
    }

    /// First Y available to content on a page with a header band.
    pub fn content_top(&self) -> f32 {
        self.margin + self.header_offset
    }

    /// Nothing but the footer band is ever drawn below this Y.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.footer_height - self.margin
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::a4()
    }
}

#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub kind: ReportKind,
    pub geometry: PageGeometry,
    /// Data rows per detailed-risk-table chunk; 0 disables chunking.
    pub rows_per_table_page: usize,
    /// Minimum rows in the worker sign-on table (blank rows pad it out).
    pub sign_on_rows: usize,
    pub include_contents_page: bool,
    pub company_name: Option<String>,
    pub confidentiality_notice: String,
    pub font: Option<PathBuf>,
    pub bold_font: Option<PathBuf>,
    /// Fixed timestamp for reproducible output; `None` uses the current time.
    pub generated_at: Option<DateTime<Utc>>,
    /// Treat a residual rating above the initial rating as an error.
    pub strict_residual: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            kind: ReportKind::Rams,
            geometry: PageGeometry::a4(),
            rows_per_table_page: 8,
            sign_on_rows: 10,
            include_contents_page: true,
            company_name: None,
            confidentiality_notice: "CONFIDENTIAL - for use by authorised site personnel only"
                .to_string(),
            font: None,
            bold_font: None,
            generated_at: None,
            strict_residual: false,
        }
    }
}

impl GenerateOptions {
    pub fn for_kind(kind: ReportKind) -> Self {
        GenerateOptions {
            kind,
            ..Default::default()
        }
    }

    /// Fill unset font paths from `RAMS_PDF_FONT` / `RAMS_PDF_BOLD_FONT`.
    pub fn with_env_fonts(mut self) -> Self {
        let from_env = |var: &str| {
            std::env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        if self.font.is_none() {
            self.font = from_env(FONT_ENV);
        }
        if self.bold_font.is_none() {
            self.bold_font = from_env(BOLD_FONT_ENV);
        }
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.generated_at.unwrap_or_else(Utc::now)
    }
}
