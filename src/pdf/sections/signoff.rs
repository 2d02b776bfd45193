use crate::error::Error;
use crate::fonts::{FontEntry, Weight};
use crate::model::{RamsData, Signatory};
use crate::options::GenerateOptions;
use crate::pdf::context::{HEADER_FILL, PRIMARY, RULE, ReportContext, TEXT, TextStyle};
use crate::pdf::layout::{WrappedLine, wrap_text};
use crate::pdf::table::{Cell, Column, Table, render_table};

use super::body_text;

const BLOCK_PADDING: f32 = 8.0;
const ROLE_BAR_H: f32 = 16.0;
const SIGNATURE_SPACE: f32 = 22.0;
const LABEL_W: f32 = 70.0;
const SIGN_ON_ROW_H: f32 = 20.0;

/// Name, position and date wrapped into the value column of a block `block_w` wide.
fn field_lines(font: &FontEntry, signatory: &Signatory, block_w: f32) -> [Vec<WrappedLine>; 3] {
    let width = block_w - LABEL_W - 2.0 * BLOCK_PADDING;
    [&signatory.name, &signatory.position, &signatory.date]
        .map(|value| wrap_text(value, width, TextStyle::BODY.size, font))
}

fn signature_block_height(fields: &[Vec<WrappedLine>]) -> f32 {
    let lh = TextStyle::BODY.line_height();
    let rows: f32 = fields.iter().map(|lines| lines.len().max(1) as f32 * lh).sum();
    ROLE_BAR_H + BLOCK_PADDING + rows + SIGNATURE_SPACE + BLOCK_PADDING
}

/// Draws a label and its wrapped value; returns the height used.
fn field(ctx: &mut ReportContext, x: f32, top: f32, label: &str, lines: &[WrappedLine]) -> f32 {
    let lh = TextStyle::BODY.line_height();
    ctx.draw_text(x, top, label, TextStyle::BODY_BOLD);
    for (k, line) in lines.iter().enumerate() {
        ctx.draw_text(x + LABEL_W, top + k as f32 * lh, &line.text, TextStyle::BODY);
    }
    lines.len().max(1) as f32 * lh
}

/// One signatory box, sized to its wrapped values and never split.
fn signature_block(ctx: &mut ReportContext, signatory: &Signatory) {
    let x = ctx.left();
    let w = ctx.content_width();
    let fields = field_lines(ctx.fonts().get(TextStyle::BODY.weight), signatory, w);
    let height = signature_block_height(&fields);
    let [name, position, date] = &fields;
    ctx.break_if_needed(height + 6.0);
    let top = ctx.y();
    let body = TextStyle::BODY;
    let role_style = TextStyle::new(9.5, Weight::Bold, PRIMARY);

    ctx.fill_rect(x, top, w, ROLE_BAR_H, HEADER_FILL);
    ctx.draw_text(x + BLOCK_PADDING, top + (ROLE_BAR_H - role_style.line_height()) / 2.0, &signatory.role, role_style);
    ctx.stroke_rect(x, top, w, height, RULE, 0.75);

    let inner_x = x + BLOCK_PADDING;
    let mut line_top = top + ROLE_BAR_H + BLOCK_PADDING;
    line_top += field(ctx, inner_x, line_top, "Name:", name);
    line_top += field(ctx, inner_x, line_top, "Position:", position);

    let sig_baseline = line_top + SIGNATURE_SPACE - 4.0;
    ctx.draw_text(inner_x, sig_baseline - body.line_height(), "Signature:", TextStyle::BODY_BOLD);
    ctx.rule(inner_x + LABEL_W, x + w * 0.65, sig_baseline, TEXT, 0.5);
    line_top += SIGNATURE_SPACE;
    field(ctx, inner_x, line_top, "Date:", date);

    ctx.advance(height + 6.0);
}

pub(crate) fn render_authorization(
    ctx: &mut ReportContext,
    data: &RamsData,
    _options: &GenerateOptions,
) -> Result<(), Error> {
    body_text(
        ctx,
        "The signatories below confirm that this document has been reviewed and that the work may proceed as described.",
    );
    for signatory in &data.signatories {
        signature_block(ctx, signatory);
    }
    Ok(())
}

/// Registered workers first, then blank rows up to `min_rows`.
pub(crate) fn sign_on_table(data: &RamsData, min_rows: usize) -> Table {
    let mut table = Table::new(vec![
        Column::centered("#", 0.4),
        Column::new("Name", 2.2),
        Column::new("Company", 2.0),
        Column::new("Signature", 2.2),
        Column::new("Date", 1.2),
    ]);
    let total = data.workers.len().max(min_rows);
    table.rows = (0..total)
        .map(|i| {
            let (name, company) = data
                .workers
                .get(i)
                .map_or(("", ""), |w| (w.name.as_str(), w.company.as_str()));
            vec![
                Cell::new((i + 1).to_string()),
                Cell::new(name),
                Cell::new(company),
                Cell::new(""),
                Cell::new(""),
            ]
        })
        .collect();
    table.min_row_height = SIGN_ON_ROW_H;
    table
}

pub(crate) fn render_sign_on(ctx: &mut ReportContext, data: &RamsData, options: &GenerateOptions) -> Result<(), Error> {
    body_text(
        ctx,
        "By signing below I confirm that I have read and understood this document, that the hazards and control measures have been explained to me, and that I will follow the method of work described.",
    );
    let table = sign_on_table(data, options.sign_on_rows);
    log::debug!(
        "worker sign-on: {} registered, {} rows",
        data.workers.len(),
        table.rows.len()
    );
    render_table(ctx, &table);
    Ok(())
}
