use pdf_writer::{Content, Name, Str};

use crate::fonts::{FontSet, Weight};
use crate::options::PageGeometry;
use crate::risk::Rgb;

use super::layout::{Alignment, LINE_HEIGHT_FACTOR, aligned_x, line_height, wrap_text};
use super::table::{TableHeader, draw_header_row};
use super::toc::{TocAccumulator, TocEntry};

pub(crate) const PRIMARY: Rgb = [0x1a, 0x3c, 0x6e];
pub(crate) const ACCENT: Rgb = [0xf5, 0x9e, 0x0b];
pub(crate) const TEXT: Rgb = [0x21, 0x21, 0x21];
pub(crate) const MUTED: Rgb = [0x61, 0x61, 0x61];
pub(crate) const RULE: Rgb = [0xb0, 0xb7, 0xc3];
pub(crate) const HEADER_FILL: Rgb = [0xe3, 0xea, 0xf4];
pub(crate) const WHITE: Rgb = [0xff, 0xff, 0xff];

const HEADER_BAND_H: f32 = 18.0;
const CONTINUATION_GAP: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TextStyle {
    pub(crate) size: f32,
    pub(crate) weight: Weight,
    pub(crate) color: Rgb,
}

impl TextStyle {
    pub(crate) const BODY: TextStyle = TextStyle::new(9.0, Weight::Regular, TEXT);
    pub(crate) const BODY_BOLD: TextStyle = TextStyle::new(9.0, Weight::Bold, TEXT);
    pub(crate) const SMALL: TextStyle = TextStyle::new(7.0, Weight::Regular, MUTED);
    pub(crate) const SUBHEADING: TextStyle = TextStyle::new(10.5, Weight::Bold, PRIMARY);
    pub(crate) const CONTINUATION: TextStyle = TextStyle::new(11.0, Weight::Bold, PRIMARY);

    pub(crate) const fn new(size: f32, weight: Weight, color: Rgb) -> Self {
        TextStyle { size, weight, color }
    }

    pub(crate) const fn colored(self, color: Rgb) -> Self {
        TextStyle { color, ..self }
    }

    pub(crate) fn line_height(&self) -> f32 {
        line_height(self.size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PageKind {
    /// No header band; content may start at the top margin.
    Title,
    /// Reserved for the table of contents, filled after layout.
    Contents,
    Body,
}

pub(crate) struct Page {
    pub(crate) content: Content,
    pub(crate) kind: PageKind,
    pub(crate) texts: Vec<String>,
    /// Largest Y reached by content (header and footer bands excluded).
    pub(crate) lowest_y: f32,
}

fn set_fill(content: &mut Content, [r, g, b]: Rgb) {
    content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
}

fn set_stroke(content: &mut Content, [r, g, b]: Rgb) {
    content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
}

/// Mutable layout state of one report generation: the page list, the
/// top-down Y cursor and the continuation context used after page breaks.
pub(crate) struct ReportContext<'a> {
    geometry: PageGeometry,
    fonts: &'a FontSet,
    header_left: String,
    header_right: String,
    pages: Vec<Page>,
    y: f32,
    page_top: f32,
    toc: TocAccumulator,
    section_title: Option<String>,
    table_header: Option<TableHeader>,
}

impl<'a> ReportContext<'a> {
    pub(crate) fn new(
        geometry: PageGeometry,
        fonts: &'a FontSet,
        header_left: String,
        header_right: String,
    ) -> Self {
        ReportContext {
            geometry,
            fonts,
            header_left,
            header_right,
            pages: Vec::new(),
            y: geometry.margin,
            page_top: geometry.margin,
            toc: TocAccumulator::default(),
            section_title: None,
            table_header: None,
        }
    }

    pub(crate) fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub(crate) fn fonts(&self) -> &'a FontSet {
        self.fonts
    }

    pub(crate) fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn left(&self) -> f32 {
        self.geometry.margin
    }

    pub(crate) fn content_width(&self) -> f32 {
        self.geometry.content_width()
    }

    pub(crate) fn bottom_limit(&self) -> f32 {
        self.geometry.content_bottom()
    }

    /// 1-based number of the page being written, 0 before the first page.
    pub(crate) fn page_number(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn current_page_kind(&self) -> Option<PageKind> {
        self.pages.last().map(|p| p.kind)
    }

    pub(crate) fn remaining(&self) -> f32 {
        self.bottom_limit() - self.y
    }

    /// Nothing has been placed on the current page yet.
    pub(crate) fn at_page_top(&self) -> bool {
        !self.pages.is_empty() && self.y <= self.page_top + 0.5
    }

    /// Height available on a fresh body page once a continuation title and
    /// `reserved` (typically a repeated table header) have been drawn.
    pub(crate) fn fresh_page_capacity(&self, reserved: f32) -> f32 {
        let continuation = match self.section_title {
            Some(_) => TextStyle::CONTINUATION.line_height() + CONTINUATION_GAP,
            None => 0.0,
        };
        self.bottom_limit() - self.geometry.content_top() - continuation - reserved
    }

    pub(crate) fn toc(&self) -> &TocAccumulator {
        &self.toc
    }

    pub(crate) fn begin_section(&mut self, title: &str) {
        self.ensure_page();
        self.toc.add_entry(title, self.page_number());
        self.section_title = Some(title.to_string());
    }

    pub(crate) fn end_section(&mut self) {
        self.section_title = None;
        self.table_header = None;
    }

    pub(crate) fn set_table_header(&mut self, header: Option<TableHeader>) {
        self.table_header = header;
    }

    pub(crate) fn start_page(&mut self, kind: PageKind) {
        self.pages.push(Page {
            content: Content::new(),
            kind,
            texts: Vec::new(),
            lowest_y: 0.0,
        });
        if kind == PageKind::Title {
            self.y = self.geometry.margin;
        } else {
            self.draw_header_band();
            self.y = self.geometry.content_top();
        }
        self.page_top = self.y;
        log::debug!("start page {} ({kind:?})", self.pages.len());
    }

    pub(crate) fn ensure_page(&mut self) {
        if self.pages.is_empty() {
            self.start_page(PageKind::Body);
        }
    }

    /// Starts a new page unless the cursor already sits at the top of an
    /// empty body page.
    pub(crate) fn ensure_fresh_body_page(&mut self) {
        let reusable = self.at_page_top() && self.current_page_kind() == Some(PageKind::Body);
        if !reusable {
            self.start_page(PageKind::Body);
        }
    }

    /// Breaks the page when `required_space` does not fit above the footer
    /// band. On a break the continuation title (if given) and the active
    /// table header are redrawn. Returns whether a break happened.
    ///
    /// A block at the top of a fresh page never triggers a break, so a block
    /// taller than a page cannot loop; renderers split such blocks.
    pub(crate) fn check_page_break(&mut self, required_space: f32, continuation: Option<&str>) -> bool {
        self.ensure_page();
        if self.y + required_space <= self.bottom_limit() || self.at_page_top() {
            return false;
        }
        log::debug!(
            "page break after page {}: y={:.1} + {:.1} > {:.1}",
            self.page_number(),
            self.y,
            required_space,
            self.bottom_limit()
        );
        self.break_page(continuation);
        true
    }

    /// `check_page_break` continuing the active section.
    pub(crate) fn break_if_needed(&mut self, required_space: f32) -> bool {
        let title = self.section_title.clone();
        self.check_page_break(required_space, title.as_deref())
    }

    /// Break continuing the active section. A no-op when nothing has been
    /// placed on the current body page yet.
    pub(crate) fn force_break(&mut self) {
        if self.at_page_top() && self.current_page_kind() == Some(PageKind::Body) {
            return;
        }
        let title = self.section_title.clone();
        self.break_page(title.as_deref());
    }

    fn break_page(&mut self, continuation: Option<&str>) {
        self.start_page(PageKind::Body);
        if let Some(title) = continuation {
            let style = TextStyle::CONTINUATION;
            let x = self.left();
            self.draw_text(x, self.y, &format!("{title} (Continued)"), style);
            self.y += style.line_height() + CONTINUATION_GAP;
        }
        if let Some(header) = self.table_header.take() {
            draw_header_row(self, &header);
            self.table_header = Some(header);
        }
        self.page_top = self.y;
    }

    /// Vertical spacing, dropped at the top of a page.
    pub(crate) fn gap(&mut self, dy: f32) {
        if !self.at_page_top() {
            self.y += dy;
        }
    }

    pub(crate) fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    fn mark(&mut self, bottom: f32) {
        if let Some(page) = self.pages.last_mut() {
            page.lowest_y = page.lowest_y.max(bottom);
        }
    }

    /// Content extent for text placed with `put_text` on an earlier page.
    pub(crate) fn mark_page(&mut self, page_idx: usize, bottom: f32) {
        if let Some(page) = self.pages.get_mut(page_idx) {
            page.lowest_y = page.lowest_y.max(bottom);
        }
    }

    /// Writes one line of text with its line box top at `top` on page
    /// `page_idx`. Does not touch the cursor or the content extent.
    pub(crate) fn put_text(&mut self, page_idx: usize, x: f32, top: f32, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        let font = self.fonts.get(style.weight);
        let half_leading = (LINE_HEIGHT_FACTOR - 1.0) / 2.0 * style.size;
        let baseline = self.geometry.height - (top + half_leading + style.size * font.ascender_ratio);
        let Some(page) = self.pages.get_mut(page_idx) else {
            return;
        };
        let content = &mut page.content;
        content.save_state();
        set_fill(content, style.color);
        content
            .begin_text()
            .set_font(Name(font.pdf_name.as_bytes()), style.size)
            .next_line(x, baseline)
            .show(Str(&font.encode(text)))
            .end_text();
        content.restore_state();
        page.texts.push(text.to_string());
    }

    /// One line of text on the current page, line box top at `top`.
    pub(crate) fn draw_text(&mut self, x: f32, top: f32, text: &str, style: TextStyle) {
        self.ensure_page();
        let idx = self.pages.len() - 1;
        self.put_text(idx, x, top, text, style);
        self.mark(top + style.line_height());
    }

    pub(crate) fn draw_text_aligned(
        &mut self,
        x: f32,
        width: f32,
        top: f32,
        text: &str,
        style: TextStyle,
        alignment: Alignment,
    ) {
        let w = self.text_width(text, style);
        self.draw_text(aligned_x(alignment, x, width, w), top, text, style);
    }

    pub(crate) fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        self.fonts.get(style.weight).word_width(text, style.size)
    }

    /// Wrapped text flowing from the cursor; breaks pages between lines.
    /// Returns the number of lines written.
    pub(crate) fn paragraph(&mut self, x: f32, width: f32, text: &str, style: TextStyle) -> usize {
        let lines = wrap_text(text, width, style.size, self.fonts.get(style.weight));
        let lh = style.line_height();
        for line in &lines {
            self.break_if_needed(lh);
            self.draw_text(x, self.y, &line.text, style);
            self.y += lh;
        }
        lines.len()
    }

    fn rect_on_current(&mut self, x: f32, top: f32, w: f32, h: f32) -> Option<&mut Content> {
        let height = self.geometry.height;
        let content = &mut self.pages.last_mut()?.content;
        content.rect(x, height - top - h, w, h);
        Some(content)
    }

    pub(crate) fn fill_rect(&mut self, x: f32, top: f32, w: f32, h: f32, color: Rgb) {
        self.ensure_page();
        if let Some(content) = self.pages.last_mut().map(|p| &mut p.content) {
            content.save_state();
            set_fill(content, color);
        }
        if let Some(content) = self.rect_on_current(x, top, w, h) {
            content.fill_nonzero();
            content.restore_state();
        }
        self.mark(top + h);
    }

    pub(crate) fn stroke_rect(&mut self, x: f32, top: f32, w: f32, h: f32, color: Rgb, line_width: f32) {
        self.ensure_page();
        if let Some(content) = self.pages.last_mut().map(|p| &mut p.content) {
            content.save_state();
            set_stroke(content, color);
            content.set_line_width(line_width);
        }
        if let Some(content) = self.rect_on_current(x, top, w, h) {
            content.stroke();
            content.restore_state();
        }
        self.mark(top + h);
    }

    /// Horizontal rule at `y` on page `page_idx`; does not mark the extent.
    pub(crate) fn put_rule(&mut self, page_idx: usize, x1: f32, x2: f32, y: f32, color: Rgb, line_width: f32) {
        let pdf_y = self.geometry.height - y;
        let Some(page) = self.pages.get_mut(page_idx) else {
            return;
        };
        let content = &mut page.content;
        content.save_state();
        set_stroke(content, color);
        content.set_line_width(line_width);
        content.move_to(x1, pdf_y);
        content.line_to(x2, pdf_y);
        content.stroke();
        content.restore_state();
    }

    pub(crate) fn rule(&mut self, x1: f32, x2: f32, y: f32, color: Rgb, line_width: f32) {
        self.ensure_page();
        let idx = self.pages.len() - 1;
        self.put_rule(idx, x1, x2, y, color, line_width);
        self.mark(y + line_width / 2.0);
    }

    fn draw_header_band(&mut self) {
        let idx = self.pages.len() - 1;
        let x = self.left();
        let w = self.content_width();
        let top = self.geometry.margin * 0.5;
        let height = self.geometry.height;
        if let Some(page) = self.pages.get_mut(idx) {
            let content = &mut page.content;
            content.save_state();
            set_fill(content, PRIMARY);
            content.rect(x, height - top - HEADER_BAND_H, w, HEADER_BAND_H);
            content.fill_nonzero();
            content.restore_state();
        }

        let style = TextStyle::new(8.0, Weight::Bold, WHITE);
        let text_top = top + (HEADER_BAND_H - style.line_height()) / 2.0;
        let left = self.header_left.clone();
        let right = self.header_right.clone();
        self.put_text(idx, x + 6.0, text_top, &left, style);
        let rw = self.text_width(&right, style);
        self.put_text(idx, x + w - 6.0 - rw, text_top, &right, style);
    }

    /// Footer band on every page: generation stamp, notice, "Page X of Y".
    /// Runs after layout so the total page count is known.
    pub(crate) fn draw_footers(&mut self, generated: &str, notice: &str) {
        let total = self.pages.len();
        let x = self.left();
        let w = self.content_width();
        let rule_y = self.bottom_limit() + 8.0;
        let style = TextStyle::SMALL;
        let line_top = rule_y + 4.0;

        for idx in 0..total {
            self.put_rule(idx, x, x + w, rule_y, RULE, 0.5);
            self.put_text(idx, x, line_top, &format!("Generated {generated}"), style);

            let page_label = format!("Page {} of {total}", idx + 1);
            let pw = self.text_width(&page_label, style);
            self.put_text(idx, x + w - pw, line_top, &page_label, style);

            let nw = self.text_width(notice, style);
            self.put_text(idx, x + (w - nw).max(0.0) / 2.0, line_top + style.line_height(), notice, style);
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Page>, Vec<TocEntry>) {
        (self.pages, self.toc.into_entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_context(fonts: &FontSet) -> ReportContext<'_> {
        let mut ctx = ReportContext::new(PageGeometry::a4(), fonts, "RAMS".into(), "NBS".into());
        ctx.start_page(PageKind::Body);
        ctx
    }

    #[test]
    fn forced_break_keeps_an_untouched_page() {
        let fonts = FontSet::builtin();
        let mut ctx = body_context(&fonts);
        ctx.begin_section("Detailed Risk Assessment");
        ctx.force_break();
        assert_eq!(ctx.page_number(), 1);

        ctx.advance(40.0);
        ctx.force_break();
        assert_eq!(ctx.page_number(), 2);
        assert!(ctx.at_page_top(), "continuation title counts as page furniture");
        ctx.force_break();
        assert_eq!(ctx.page_number(), 2);
    }

    #[test]
    fn oversized_block_at_page_top_does_not_break() {
        let fonts = FontSet::builtin();
        let mut ctx = body_context(&fonts);
        assert!(!ctx.check_page_break(5000.0, None));
        ctx.advance(10.0);
        assert!(ctx.check_page_break(ctx.remaining() + 1.0, Some("Risk Matrix")));
        assert_eq!(ctx.page_number(), 2);
        assert!(ctx.pages[1].texts.iter().any(|t| t == "Risk Matrix (Continued)"));
    }

    #[test]
    fn title_page_is_not_reused_by_a_forced_break() {
        let fonts = FontSet::builtin();
        let mut ctx = ReportContext::new(PageGeometry::a4(), &fonts, String::new(), String::new());
        ctx.start_page(PageKind::Title);
        ctx.force_break();
        assert_eq!(ctx.page_number(), 2);
        assert_eq!(ctx.current_page_kind(), Some(PageKind::Body));
    }
}
