use crate::fonts::Weight;
use crate::options::PageGeometry;

use super::context::{MUTED, PRIMARY, ReportContext, TEXT, TextStyle};

/// A section title and the 1-based page it starts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub page: usize,
}

#[derive(Debug, Default)]
pub(crate) struct TocAccumulator {
    entries: Vec<TocEntry>,
}

impl TocAccumulator {
    pub(crate) fn add_entry(&mut self, title: &str, page: usize) {
        log::debug!("toc: {title:?} on page {page}");
        self.entries.push(TocEntry {
            title: title.to_string(),
            page,
        });
    }

    pub(crate) fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<TocEntry> {
        self.entries
    }
}

const ENTRY_GAP: f32 = 6.0;
const HEADING_GAP: f32 = 10.0;
const HEADING: TextStyle = TextStyle::new(16.0, Weight::Bold, PRIMARY);
const ENTRY: TextStyle = TextStyle::new(10.0, Weight::Regular, TEXT);

/// Entries that fit on one contents page below its heading.
pub(crate) fn entries_per_page(geometry: &PageGeometry) -> usize {
    let avail = geometry.content_bottom() - geometry.content_top() - HEADING.line_height() - HEADING_GAP;
    ((avail + ENTRY_GAP) / (ENTRY.line_height() + ENTRY_GAP)).floor().max(1.0) as usize
}

/// Contents pages to reserve for `entry_count` entries.
pub(crate) fn contents_page_count(entry_count: usize, geometry: &PageGeometry) -> usize {
    entry_count.div_ceil(entries_per_page(geometry)).max(1)
}

/// Dots filling `space` points, or an empty string if not even one fits.
fn leader(ctx: &ReportContext, space: f32, style: TextStyle) -> String {
    let dot = ctx.text_width(".", style);
    if dot <= 0.0 || space < dot {
        return String::new();
    }
    ".".repeat((space / dot).floor() as usize)
}

/// Writes the contents listing onto the `page_count` reserved pages starting
/// at `first_page` (0-based). Runs after layout, once every section's start
/// page is known.
pub(crate) fn fill_contents_pages(ctx: &mut ReportContext, first_page: usize, page_count: usize) {
    let entries: Vec<TocEntry> = ctx.toc().entries().to_vec();
    let per_page = entries_per_page(ctx.geometry());
    let x = ctx.left();
    let width = ctx.content_width();

    if entries.len() > per_page * page_count {
        log::warn!(
            "contents: {} entries exceed {page_count} reserved page(s), listing the first {}",
            entries.len(),
            per_page * page_count
        );
    }

    for (p, chunk) in entries.chunks(per_page).take(page_count).enumerate() {
        let page_idx = first_page + p;
        let mut top = ctx.geometry().content_top();
        let heading = if p == 0 { "Contents" } else { "Contents (Continued)" };
        ctx.put_text(page_idx, x, top, heading, HEADING);
        top += HEADING.line_height() + HEADING_GAP;

        for (k, entry) in chunk.iter().enumerate() {
            let label = format!("{}. {}", p * per_page + k + 1, entry.title);
            let number = entry.page.to_string();
            let label_w = ctx.text_width(&label, ENTRY);
            let number_w = ctx.text_width(&number, ENTRY);

            ctx.put_text(page_idx, x, top, &label, ENTRY);
            let dots_space = width - label_w - number_w - 2.0 * ENTRY_GAP;
            let dots = leader(ctx, dots_space, ENTRY);
            if !dots.is_empty() {
                let dots_w = ctx.text_width(&dots, ENTRY);
                let dots_x = x + width - number_w - ENTRY_GAP - dots_w;
                ctx.put_text(page_idx, dots_x, top, &dots, ENTRY.colored(MUTED));
            }
            ctx.put_text(page_idx, x + width - number_w, top, &number, ENTRY);
            ctx.mark_page(page_idx, top + ENTRY.line_height());
            top += ENTRY.line_height() + ENTRY_GAP;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_in_insertion_order() {
        let mut toc = TocAccumulator::default();
        toc.add_entry("Project Information", 3);
        toc.add_entry("Work Activities", 3);
        toc.add_entry("Risk Matrix", 4);
        let titles: Vec<&str> = toc.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Project Information", "Work Activities", "Risk Matrix"]);
        assert_eq!(toc.into_entries()[2].page, 4);
    }

    #[test]
    fn contents_pages_hold_every_entry_within_bounds() {
        let geometry = PageGeometry::a4();
        let per_page = entries_per_page(&geometry);
        let used = HEADING.line_height()
            + HEADING_GAP
            + per_page as f32 * ENTRY.line_height()
            + (per_page - 1) as f32 * ENTRY_GAP;
        assert!(geometry.content_top() + used <= geometry.content_bottom());

        assert_eq!(contents_page_count(0, &geometry), 1);
        assert_eq!(contents_page_count(8, &geometry), 1);
        assert_eq!(contents_page_count(per_page, &geometry), 1);
        assert_eq!(contents_page_count(per_page + 1, &geometry), 2);
    }
}
