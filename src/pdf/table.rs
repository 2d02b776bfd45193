use std::ops::Range;

use crate::fonts::{FontSet, Weight};
use crate::risk::Rgb;

use super::context::{HEADER_FILL, PRIMARY, RULE, ReportContext, TEXT, TextStyle};
use super::layout::{Alignment, WrappedLine, wrap_text};

const CELL_PADDING: f32 = 3.0;
const BORDER_WIDTH: f32 = 0.5;

pub(crate) struct Column {
    pub(crate) label: String,
    /// Relative share of the table width before auto-fit.
    pub(crate) weight: f32,
    pub(crate) align: Alignment,
}

impl Column {
    pub(crate) fn new(label: &str, weight: f32) -> Self {
        Column {
            label: label.to_string(),
            weight,
            align: Alignment::Left,
        }
    }

    pub(crate) fn centered(label: &str, weight: f32) -> Self {
        Column {
            align: Alignment::Center,
            ..Column::new(label, weight)
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Cell {
    pub(crate) text: String,
    pub(crate) style: TextStyle,
    pub(crate) fill: Option<Rgb>,
}

impl Cell {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Cell {
            text: text.into(),
            style: TextStyle::new(8.0, Weight::Regular, TEXT),
            fill: None,
        }
    }

    pub(crate) fn bold(mut self) -> Self {
        self.style.weight = Weight::Bold;
        self
    }

    pub(crate) fn shaded(mut self, fill: Rgb, text_color: Rgb) -> Self {
        self.fill = Some(fill);
        self.style.color = text_color;
        self
    }
}

pub(crate) struct Table {
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Vec<Cell>>,
    pub(crate) font_size: f32,
    /// Rows are at least this tall (sign-on rows need room to write in).
    pub(crate) min_row_height: f32,
    /// Data rows per chunk; every chunk after the first starts a new page.
    /// 0 keeps the table in one chunk.
    pub(crate) rows_per_chunk: usize,
}

impl Table {
    pub(crate) fn new(columns: Vec<Column>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
            font_size: 8.0,
            min_row_height: 0.0,
            rows_per_chunk: 0,
        }
    }
}

/// Header row state kept by the context so it can be redrawn after a break.
#[derive(Clone, Debug)]
pub(crate) struct TableHeader {
    pub(crate) x: f32,
    pub(crate) widths: Vec<f32>,
    pub(crate) labels: Vec<String>,
    pub(crate) aligns: Vec<Alignment>,
    pub(crate) style: TextStyle,
    pub(crate) height: f32,
}

/// Splits `total` rows into consecutive chunks of at most `per_chunk`.
/// `per_chunk == 0` gives a single chunk; no rows gives no chunks.
pub fn chunk_rows(total: usize, per_chunk: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    if per_chunk == 0 {
        return vec![0..total];
    }
    (0..total)
        .step_by(per_chunk)
        .map(|start| start..(start + per_chunk).min(total))
        .collect()
}

/// Column widths from the relative weights, then auto-fit so the longest
/// unbreakable word in each column fits inside the cell padding. Columns
/// that need more space grow; the rest shrink proportionally. Total width is
/// preserved.
fn auto_fit_columns(table: &Table, header_style: TextStyle, fonts: &FontSet, total: f32) -> Vec<f32> {
    let ncols = table.columns.len();
    if ncols == 0 {
        return Vec::new();
    }
    let weight_sum: f32 = table.columns.iter().map(|c| c.weight.max(0.0)).sum();
    let mut widths: Vec<f32> = if weight_sum > 0.0 {
        table
            .columns
            .iter()
            .map(|c| total * c.weight.max(0.0) / weight_sum)
            .collect()
    } else {
        vec![total / ncols as f32; ncols]
    };

    let longest_word = |text: &str, style: TextStyle| {
        let font = fonts.get(style.weight);
        text.split_whitespace()
            .map(|w| font.word_width(w, style.size))
            .fold(0.0f32, f32::max)
    };
    let mut min_widths: Vec<f32> = table
        .columns
        .iter()
        .map(|c| longest_word(&c.label, header_style))
        .collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate().take(ncols) {
            min_widths[i] = min_widths[i].max(longest_word(&cell.text, cell.style));
        }
    }
    for w in &mut min_widths {
        *w += 2.0 * CELL_PADDING;
    }

    let mut extra_needed = 0.0f32;
    let mut shrinkable = 0.0f32;
    for i in 0..ncols {
        if min_widths[i] > widths[i] {
            extra_needed += min_widths[i] - widths[i];
            widths[i] = min_widths[i];
        } else {
            shrinkable += widths[i] - min_widths[i];
        }
    }

    if extra_needed > 0.0 && shrinkable > 0.0 {
        let factor = extra_needed.min(shrinkable) / shrinkable;
        for i in 0..ncols {
            if widths[i] > min_widths[i] {
                widths[i] -= (widths[i] - min_widths[i]) * factor;
            }
        }
    }
    let new_total: f32 = widths.iter().sum();
    if new_total > 0.0 && (new_total - total).abs() > 0.01 {
        let scale = total / new_total;
        for w in &mut widths {
            *w *= scale;
        }
    }
    widths
}

struct RowLayout {
    height: f32,
    cell_lines: Vec<Vec<WrappedLine>>,
}

fn layout_row(row: &[Cell], widths: &[f32], fonts: &FontSet, min_height: f32) -> RowLayout {
    let mut content_h = 0.0f32;
    let cell_lines: Vec<Vec<WrappedLine>> = row
        .iter()
        .zip(widths)
        .map(|(cell, &w)| {
            let font = fonts.get(cell.style.weight);
            let lines = wrap_text(&cell.text, (w - 2.0 * CELL_PADDING).max(0.0), cell.style.size, font);
            content_h = content_h.max(lines.len() as f32 * cell.style.line_height());
            lines
        })
        .collect();
    let fallback_line = row.first().map_or(0.0, |c| c.style.line_height());
    RowLayout {
        height: (content_h.max(fallback_line) + 2.0 * CELL_PADDING).max(min_height),
        cell_lines,
    }
}

fn cell_x(header: &TableHeader, col: usize) -> f32 {
    header.x + header.widths[..col].iter().sum::<f32>()
}

pub(crate) fn draw_header_row(ctx: &mut ReportContext, header: &TableHeader) {
    let top = ctx.y();
    let total: f32 = header.widths.iter().sum();
    ctx.fill_rect(header.x, top, total, header.height, HEADER_FILL);
    let text_top = top + (header.height - header.style.line_height()) / 2.0;
    for (i, label) in header.labels.iter().enumerate() {
        let x = cell_x(header, i);
        let w = header.widths[i];
        ctx.draw_text_aligned(
            x + CELL_PADDING,
            w - 2.0 * CELL_PADDING,
            text_top,
            label,
            header.style,
            header.aligns[i],
        );
        ctx.stroke_rect(x, top, w, header.height, RULE, BORDER_WIDTH);
    }
    ctx.advance(header.height);
}

/// Draws lines `from..` of every cell, as many as fit in `avail`. Returns
/// the per-cell line index reached.
fn draw_row_fragment(
    ctx: &mut ReportContext,
    header: &TableHeader,
    row: &[Cell],
    layout: &RowLayout,
    from: &[usize],
    avail: f32,
    whole: bool,
) -> Vec<usize> {
    let top = ctx.y();
    let mut reached = Vec::with_capacity(row.len());
    let mut used = 0.0f32;
    for (i, cell) in row.iter().enumerate() {
        let lines = &layout.cell_lines[i];
        let lh = cell.style.line_height();
        let fit = ((avail - 2.0 * CELL_PADDING) / lh + 1e-3).floor().max(1.0) as usize;
        let end = (from[i] + fit).min(lines.len());
        used = used.max((end - from[i]) as f32 * lh);
        reached.push(end);
    }
    let height = if whole {
        layout.height
    } else {
        used + 2.0 * CELL_PADDING
    };

    for (i, cell) in row.iter().enumerate() {
        let x = cell_x(header, i);
        let w = header.widths[i];
        if let Some(fill) = cell.fill {
            ctx.fill_rect(x, top, w, height, fill);
        }
        let lh = cell.style.line_height();
        let lines = &layout.cell_lines[i][from[i]..reached[i]];
        for (k, line) in lines.iter().enumerate() {
            ctx.draw_text_aligned(
                x + CELL_PADDING,
                w - 2.0 * CELL_PADDING,
                top + CELL_PADDING + k as f32 * lh,
                &line.text,
                cell.style,
                header.aligns[i],
            );
        }
        ctx.stroke_rect(x, top, w, height, RULE, BORDER_WIDTH);
    }
    ctx.advance(height);
    reached
}

fn draw_row(ctx: &mut ReportContext, header: &TableHeader, row: &[Cell], layout: &RowLayout) {
    let capacity = ctx.fresh_page_capacity(header.height);
    if layout.height <= capacity {
        ctx.break_if_needed(layout.height);
        let from = vec![0; row.len()];
        draw_row_fragment(ctx, header, row, layout, &from, layout.height, true);
        return;
    }

    // Taller than a page: split into fragments, continuing on the next page.
    log::debug!(
        "table row of {:.1}pt exceeds page capacity {capacity:.1}pt, splitting",
        layout.height
    );
    let min_fragment = row.iter().map(|c| c.style.line_height()).fold(0.0f32, f32::max) + 2.0 * CELL_PADDING;
    let mut from = vec![0; row.len()];
    loop {
        ctx.break_if_needed(min_fragment);
        let avail = ctx.remaining();
        from = draw_row_fragment(ctx, header, row, layout, &from, avail, false);
        let done = from
            .iter()
            .zip(&layout.cell_lines)
            .all(|(&f, lines)| f >= lines.len());
        if done {
            break;
        }
        ctx.force_break();
    }
}

/// Renders a bordered table from the cursor. The header row is repeated on
/// every page the table spans, and chunks after the first start on a new
/// page under the section's continuation title.
pub(crate) fn render_table(ctx: &mut ReportContext, table: &Table) {
    let fonts = ctx.fonts();
    let header_style = TextStyle::new(table.font_size, Weight::Bold, PRIMARY);
    let widths = auto_fit_columns(table, header_style, fonts, ctx.content_width());
    let header = TableHeader {
        x: ctx.left(),
        labels: table.columns.iter().map(|c| c.label.clone()).collect(),
        aligns: table.columns.iter().map(|c| c.align).collect(),
        height: header_style.line_height() + 2.0 * CELL_PADDING,
        widths,
        style: header_style,
    };
    let layouts: Vec<RowLayout> = table
        .rows
        .iter()
        .map(|row| layout_row(row, &header.widths, fonts, table.min_row_height))
        .collect();

    let chunks = chunk_rows(table.rows.len(), table.rows_per_chunk);
    log::debug!(
        "table: {} columns, {} rows in {} chunk(s)",
        table.columns.len(),
        table.rows.len(),
        chunks.len()
    );

    if chunks.is_empty() {
        ctx.break_if_needed(header.height);
        draw_header_row(ctx, &header);
        return;
    }

    for (ci, range) in chunks.into_iter().enumerate() {
        if ci == 0 {
            let capacity = ctx.fresh_page_capacity(header.height);
            let first_row = layouts.get(range.start).map_or(0.0, |l| l.height.min(capacity));
            ctx.break_if_needed(header.height + first_row);
            draw_header_row(ctx, &header);
            ctx.set_table_header(Some(header.clone()));
        } else {
            ctx.force_break();
        }
        for i in range {
            draw_row(ctx, &header, &table.rows[i], &layouts[i]);
        }
    }
    ctx.set_table_header(None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_rows_in_order() {
        assert_eq!(chunk_rows(20, 8), vec![0..8, 8..16, 16..20]);
        assert_eq!(chunk_rows(16, 8), vec![0..8, 8..16]);
        assert_eq!(chunk_rows(3, 0), vec![0..3]);
        assert!(chunk_rows(0, 8).is_empty());
    }

    #[test]
    fn auto_fit_preserves_total_and_fits_long_words() {
        let fonts = FontSet::builtin();
        let mut table = Table::new(vec![Column::new("#", 0.2), Column::new("Hazard", 5.0)]);
        table.rows.push(vec![Cell::new("12345678901234"), Cell::new("Slips")]);
        let style = TextStyle::new(8.0, Weight::Bold, PRIMARY);
        let widths = auto_fit_columns(&table, style, &fonts, 300.0);
        assert!((widths.iter().sum::<f32>() - 300.0).abs() < 0.05);
        let needed = fonts.regular.word_width("12345678901234", 8.0) + 2.0 * CELL_PADDING;
        assert!(widths[0] + 0.05 >= needed);
    }

    #[test]
    fn row_height_follows_tallest_cell() {
        let fonts = FontSet::builtin();
        let cells = vec![Cell::new("one"), Cell::new("a b c d e f g h i j k l m n o p")];
        let layout = layout_row(&cells, &[50.0, 20.0], &fonts, 0.0);
        let lines = layout.cell_lines[1].len();
        assert!(lines > 1);
        let expected = lines as f32 * cells[1].style.line_height() + 2.0 * CELL_PADDING;
        assert!((layout.height - expected).abs() < 1e-3);
        assert_eq!(layout_row(&cells[..1], &[50.0], &fonts, 40.0).height, 40.0);
    }
}
