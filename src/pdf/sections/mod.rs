pub(crate) mod activities;
pub(crate) mod matrix;
pub(crate) mod project;
pub(crate) mod risks;
pub(crate) mod safety;
pub(crate) mod signoff;
pub(crate) mod title;

use crate::fonts::Weight;

use super::context::{PRIMARY, ReportContext, TextStyle, WHITE};
use super::table::{Cell, Column, Table, render_table};

const HEADING_BAND_H: f32 = 20.0;
/// Room kept below a heading so it is never stranded at the page bottom.
const KEEP_WITH_NEXT: f32 = 48.0;
pub(crate) const BLOCK_GAP: f32 = 10.0;

/// Section heading band. Breaks first if the band and the start of the
/// section would not fit, then records the section in the TOC so the entry
/// carries the page the heading actually lands on.
pub(crate) fn section_heading(ctx: &mut ReportContext, title: &str) {
    ctx.check_page_break(HEADING_BAND_H + KEEP_WITH_NEXT, None);
    ctx.gap(BLOCK_GAP);
    ctx.begin_section(title);

    let style = TextStyle::new(12.0, Weight::Bold, WHITE);
    let x = ctx.left();
    let w = ctx.content_width();
    let top = ctx.y();
    ctx.fill_rect(x, top, w, HEADING_BAND_H, PRIMARY);
    ctx.draw_text(x + 8.0, top + (HEADING_BAND_H - style.line_height()) / 2.0, title, style);
    ctx.advance(HEADING_BAND_H + 8.0);
}

pub(crate) fn subheading(ctx: &mut ReportContext, text: &str) {
    let style = TextStyle::SUBHEADING;
    ctx.break_if_needed(style.line_height() + 2.0 * TextStyle::BODY.line_height());
    ctx.gap(4.0);
    let x = ctx.left();
    ctx.draw_text(x, ctx.y(), text, style);
    ctx.advance(style.line_height() + 3.0);
}

pub(crate) fn body_text(ctx: &mut ReportContext, text: &str) {
    let x = ctx.left();
    let w = ctx.content_width();
    ctx.paragraph(x, w, text, TextStyle::BODY);
    ctx.advance(4.0);
}

pub(crate) fn bullets(ctx: &mut ReportContext, items: &[String], indent: f32) {
    let style = TextStyle::BODY;
    let x = ctx.left() + indent;
    let text_x = x + 10.0;
    let width = ctx.content_width() - indent - 10.0;
    for item in items {
        ctx.break_if_needed(style.line_height());
        ctx.draw_text(x, ctx.y(), "\u{2022}", style);
        ctx.paragraph(text_x, width, item, style);
        ctx.advance(1.5);
    }
}

/// Two-column label/value table.
pub(crate) fn key_value_table(ctx: &mut ReportContext, rows: &[(&str, &str)]) {
    let mut table = Table::new(vec![Column::new("Item", 1.0), Column::new("Details", 2.6)]);
    table.rows = rows
        .iter()
        .map(|(label, value)| vec![Cell::new(*label).bold(), Cell::new(*value)])
        .collect();
    render_table(ctx, &table);
    ctx.advance(4.0);
}

/// Comma-separated list of step numbers, e.g. "Steps 1, 3" or "Step 2".
pub(crate) fn step_list(numbers: &[u32]) -> String {
    let joined = numbers
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if numbers.len() == 1 {
        format!("Step {joined}")
    } else {
        format!("Steps {joined}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_list_pluralizes() {
        assert_eq!(step_list(&[2]), "Step 2");
        assert_eq!(step_list(&[1, 3]), "Steps 1, 3");
    }
}
