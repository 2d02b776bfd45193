pub(crate) mod context;
pub(crate) mod layout;
pub(crate) mod sections;
pub(crate) mod table;
pub(crate) mod toc;

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Timelike, Utc};
use pdf_writer::{Date, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::error::Error;
use crate::fonts::{FontSet, base_charset};
use crate::model::RamsData;
use crate::options::GenerateOptions;
use crate::pipeline::{Pipeline, Placement, SectionId};

use context::{PageKind, ReportContext};
pub use toc::TocEntry;

/// What was drawn on one page, for inspection by callers and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct PageSummary {
    /// 1-based.
    pub number: usize,
    pub texts: Vec<String>,
    /// Largest top-down Y reached by body content (header and footer bands
    /// are not counted).
    pub lowest_content_y: f32,
}

impl PageSummary {
    pub fn contains(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.contains(needle))
    }
}

#[derive(Clone, Debug)]
pub struct Report {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub toc: Vec<TocEntry>,
    pub pages: Vec<PageSummary>,
}

/// Every character the report may draw, so embedded fonts can be subset.
fn used_chars(
    data: &RamsData,
    options: &GenerateOptions,
    pipeline: &Pipeline,
) -> Result<BTreeSet<char>, Error> {
    let mut chars = base_charset();
    for section in pipeline.sections() {
        chars.extend(section.title.chars());
    }
    chars.extend(serde_json::to_string(data)?.chars());
    chars.extend(options.confidentiality_notice.chars());
    chars.extend(options.kind.title().chars());
    if let Some(company) = &options.company_name {
        chars.extend(company.chars());
    }
    Ok(chars)
}

fn header_right(data: &RamsData, options: &GenerateOptions) -> String {
    match options.company_name.as_deref().map(str::trim) {
        Some(company) if !company.is_empty() => company.to_string(),
        _ => data.project.job_reference.clone(),
    }
}

fn pdf_date(at: &DateTime<Utc>) -> Date {
    Date::new(at.year().clamp(0, 9999) as u16)
        .month(at.month() as u8)
        .day(at.day() as u8)
        .hour(at.hour() as u8)
        .minute(at.minute() as u8)
        .second(at.second() as u8)
        .utc_offset_hour(0)
}

/// Lays out `data` through `pipeline` and serializes the PDF. `data` must
/// already be sanitized.
pub(crate) fn render(data: &RamsData, options: &GenerateOptions, pipeline: &Pipeline) -> Result<Report, Error> {
    let t0 = std::time::Instant::now();
    let generated_at = options.timestamp();

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: fonts, subset to the characters this report can contain
    let chars = used_chars(data, options, pipeline)?;
    let fonts = FontSet::register(
        &mut pdf,
        options.font.as_deref(),
        options.bold_font.as_deref(),
        &chars,
        &mut alloc,
    )?;
    let t_fonts = t0.elapsed();

    // Phase 2: run the pipeline
    let geometry = options.geometry;
    let header_left = format!("{} | {}", options.kind.short_title(), data.project.project_name);
    let mut ctx = ReportContext::new(geometry, &fonts, header_left, header_right(data, options));
    let contents_pages = toc::contents_page_count(pipeline.len(), &geometry);
    let mut contents_page: Option<usize> = None;
    let reserve_contents = |ctx: &mut ReportContext, slot: &mut Option<usize>| {
        if options.include_contents_page && slot.is_none() {
            *slot = Some(ctx.page_number());
            for _ in 0..contents_pages {
                ctx.start_page(PageKind::Contents);
            }
        }
    };

    for (i, section) in pipeline.sections().iter().enumerate() {
        let ts = std::time::Instant::now();
        match section.id.placement() {
            Placement::TitlePage => {
                ctx.start_page(PageKind::Title);
                ctx.begin_section(&section.title);
            }
            placement => {
                if i == 0 || pipeline.sections()[i - 1].id == SectionId::TitlePage {
                    reserve_contents(&mut ctx, &mut contents_page);
                }
                if placement == Placement::NewPage {
                    ctx.ensure_fresh_body_page();
                }
                sections::section_heading(&mut ctx, &section.title);
            }
        }
        section.render(&mut ctx, data, options)?;
        ctx.end_section();
        log::debug!(
            "section {:?} rendered in {:.1}ms, now on page {}",
            section.id,
            ts.elapsed().as_secs_f64() * 1000.0,
            ctx.page_number()
        );
    }
    reserve_contents(&mut ctx, &mut contents_page);
    let t_layout = t0.elapsed();

    // Phase 3: deferred passes that need the final page count
    if let Some(first) = contents_page {
        toc::fill_contents_pages(&mut ctx, first, contents_pages);
    }
    let stamp = generated_at.format("%d/%m/%Y %H:%M UTC").to_string();
    ctx.draw_footers(&stamp, &options.confidentiality_notice);
    let t_deferred = t0.elapsed();

    // Phase 4: page tree and objects
    let (pages, toc) = ctx.into_parts();
    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let mut summaries = Vec::with_capacity(n);
    for (i, page) in pages.into_iter().enumerate() {
        let raw = page.content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        summaries.push(PageSummary {
            number: i + 1,
            texts: page.texts,
            lowest_content_y: page.lowest_y,
        });
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id).kids(page_ids.iter().copied()).count(n as i32);

    let font_pairs: Vec<(String, Ref)> = fonts
        .entries()
        .iter()
        .map(|f| (f.pdf_name.clone(), f.font_ref))
        .collect();
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        for (name, font_ref) in &font_pairs {
            font_dict.pair(Name(name.as_bytes()), *font_ref);
        }
    }

    let doc_title = format!("{} - {}", options.kind.title(), data.project.project_name);
    pdf.document_info(info_id)
        .title(TextStr(&doc_title))
        .producer(TextStr(concat!("rams-pdf ", env!("CARGO_PKG_VERSION"))))
        .creation_date(pdf_date(&generated_at));
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: fonts={:.1}ms, layout={:.1}ms, deferred={:.1}ms, assembly={:.1}ms ({n} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_deferred - t_layout).as_secs_f64() * 1000.0,
        (t_assembly - t_deferred).as_secs_f64() * 1000.0,
    );

    Ok(Report {
        bytes: pdf.finish(),
        page_count: n,
        toc,
        pages: summaries,
    })
}
