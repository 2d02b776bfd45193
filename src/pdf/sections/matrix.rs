use std::collections::BTreeMap;

use crate::error::Error;
use crate::fonts::Weight;
use crate::model::RamsData;
use crate::options::GenerateOptions;
use crate::pdf::context::{PRIMARY, RULE, ReportContext, TEXT, TextStyle};
use crate::pdf::layout::Alignment;
use crate::risk::{MAX_FACTOR, MIN_FACTOR, RiskBand, RiskRating};

use super::body_text;

const AXIS_W: f32 = 92.0;
const CELL_H: f32 = 34.0;
const SEVERITY_LABEL_H: f32 = 26.0;
const SWATCH: f32 = 10.0;

const LIKELIHOOD_LABELS: [&str; 5] = ["Rare", "Unlikely", "Possible", "Likely", "Almost certain"];
const SEVERITY_LABELS: [&str; 5] = ["Negligible", "Minor", "Moderate", "Major", "Catastrophic"];

/// Number of risks at each (likelihood, severity) cell.
fn cell_counts(data: &RamsData) -> BTreeMap<(u8, u8), usize> {
    let mut counts = BTreeMap::new();
    for risk in &data.risks {
        *counts.entry((risk.likelihood, risk.severity)).or_insert(0) += 1;
    }
    counts
}

fn band_counts(ratings: impl Iterator<Item = RiskRating>) -> String {
    let mut per_band: BTreeMap<RiskBand, usize> = BTreeMap::new();
    for r in ratings {
        *per_band.entry(r.band()).or_insert(0) += 1;
    }
    RiskBand::ALL
        .iter()
        .map(|b| format!("{} {}", b.label(), per_band.get(b).copied().unwrap_or(0)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn draw_grid(ctx: &mut ReportContext, counts: &BTreeMap<(u8, u8), usize>) {
    let x = ctx.left();
    let cell_w = (ctx.content_width() - AXIS_W) / MAX_FACTOR as f32;
    let label_style = TextStyle::new(7.5, Weight::Bold, PRIMARY);
    let small = TextStyle::new(7.0, Weight::Regular, TEXT);
    let top = ctx.y();

    ctx.draw_text_aligned(x, AXIS_W, top, "Likelihood / Severity", label_style, Alignment::Left);
    for s in MIN_FACTOR..=MAX_FACTOR {
        let cx = x + AXIS_W + (s - 1) as f32 * cell_w;
        ctx.draw_text_aligned(cx, cell_w, top, &s.to_string(), label_style, Alignment::Center);
        ctx.draw_text_aligned(
            cx,
            cell_w,
            top + label_style.line_height(),
            SEVERITY_LABELS[(s - 1) as usize],
            small,
            Alignment::Center,
        );
    }

    let grid_top = top + SEVERITY_LABEL_H;
    // Highest likelihood on the top row.
    for (row, l) in (MIN_FACTOR..=MAX_FACTOR).rev().enumerate() {
        let row_top = grid_top + row as f32 * CELL_H;
        let label = format!("{l} {}", LIKELIHOOD_LABELS[(l - 1) as usize]);
        let label_top = row_top + (CELL_H - label_style.line_height()) / 2.0;
        ctx.draw_text(x, label_top, &label, label_style);

        for s in MIN_FACTOR..=MAX_FACTOR {
            let rating = RiskRating::new(l, s);
            let band = rating.band();
            let cx = x + AXIS_W + (s - 1) as f32 * cell_w;
            ctx.fill_rect(cx, row_top, cell_w, CELL_H, band.color());
            ctx.stroke_rect(cx, row_top, cell_w, CELL_H, RULE, 0.5);

            let value_style = TextStyle::new(10.0, Weight::Bold, band.text_color());
            ctx.draw_text_aligned(cx, cell_w, row_top + 4.0, &rating.to_string(), value_style, Alignment::Center);
            if let Some(&n) = counts.get(&(l, s)) {
                let noun = if n == 1 { "risk" } else { "risks" };
                let count_style = TextStyle::new(7.0, Weight::Regular, band.text_color());
                ctx.draw_text_aligned(
                    cx,
                    cell_w,
                    row_top + 4.0 + value_style.line_height(),
                    &format!("{n} {noun}"),
                    count_style,
                    Alignment::Center,
                );
            }
        }
    }
    ctx.advance(SEVERITY_LABEL_H + MAX_FACTOR as f32 * CELL_H + 10.0);
}

fn draw_legend(ctx: &mut ReportContext) {
    let style = TextStyle::new(8.0, Weight::Regular, TEXT);
    let x0 = ctx.left();
    let slot = ctx.content_width() / RiskBand::ALL.len() as f32;
    let top = ctx.y();
    for (i, band) in RiskBand::ALL.into_iter().enumerate() {
        let x = x0 + i as f32 * slot;
        let range = band.range();
        ctx.fill_rect(x, top + 0.5, SWATCH, SWATCH, band.color());
        ctx.stroke_rect(x, top + 0.5, SWATCH, SWATCH, RULE, 0.5);
        let label = format!("{} ({}-{})", band.label(), range.start(), range.end());
        ctx.draw_text(x + SWATCH + 4.0, top, &label, style);
    }
    ctx.advance(style.line_height() + 8.0);
}

pub(crate) fn render(ctx: &mut ReportContext, data: &RamsData, _options: &GenerateOptions) -> Result<(), Error> {
    body_text(
        ctx,
        "Risk rating = likelihood \u{00D7} severity, each scored 1 to 5. Cells show the rating and the number of assessed hazards at that score before controls.",
    );

    let grid_h = SEVERITY_LABEL_H + MAX_FACTOR as f32 * CELL_H + 10.0;
    let legend_h = TextStyle::new(8.0, Weight::Regular, TEXT).line_height() + 8.0;
    ctx.break_if_needed(grid_h + legend_h);

    let counts = cell_counts(data);
    draw_grid(ctx, &counts);
    draw_legend(ctx);

    if !data.risks.is_empty() {
        body_text(ctx, &format!("Initial ratings: {}.", band_counts(data.risks.iter().map(|r| r.rating()))));
        body_text(
            ctx,
            &format!(
                "Residual ratings: {}.",
                band_counts(data.risks.iter().map(|r| r.residual_rating()))
            ),
        );
    }
    log::debug!("risk matrix: {} occupied cells", counts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskEntry;

    #[test]
    fn counts_group_by_cell() {
        let data = RamsData {
            risks: vec![
                RiskEntry::new("Falls", 3, 4, ""),
                RiskEntry::new("Noise", 3, 4, ""),
                RiskEntry::new("Dust", 1, 2, ""),
            ],
            ..Default::default()
        };
        let counts = cell_counts(&data);
        assert_eq!(counts.get(&(3, 4)), Some(&2));
        assert_eq!(counts.get(&(1, 2)), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn band_summary_lists_every_band() {
        let ratings = [RiskRating::new(4, 5), RiskRating::new(1, 1)].into_iter();
        assert_eq!(band_counts(ratings), "Low 1, Medium 0, High 0, Very High 1");
    }
}
