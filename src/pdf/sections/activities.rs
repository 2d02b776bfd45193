use crate::error::Error;
use crate::fonts::Weight;
use crate::model::{MethodStep, RamsData, RiskEntry};
use crate::options::GenerateOptions;
use crate::pdf::context::{HEADER_FILL, MUTED, PRIMARY, ReportContext, TextStyle};
use crate::pdf::layout::{Alignment, line_height, text_block_height, wrap_text};
use crate::steps::StepGraph;

use super::{BLOCK_GAP, body_text, bullets, step_list};

const STEP_BAR_H: f32 = 18.0;
const BADGE_W: f32 = 74.0;
const INDENT: f32 = 8.0;

/// Height of the step bar plus the first lines of the description, kept
/// together so a step title never ends a page on its own.
fn step_lead_height(ctx: &ReportContext, step: &MethodStep) -> f32 {
    let style = TextStyle::BODY;
    let font = ctx.fonts().get(style.weight);
    let lines = wrap_text(&step.description, ctx.content_width() - INDENT, style.size, font).len();
    STEP_BAR_H + 6.0 + text_block_height(lines.min(3), style.size)
}

fn step_bar(ctx: &mut ReportContext, step: &MethodStep) {
    let x = ctx.left();
    let w = ctx.content_width();
    let top = ctx.y();
    ctx.fill_rect(x, top, w, STEP_BAR_H, HEADER_FILL);

    let title_style = TextStyle::new(10.0, Weight::Bold, PRIMARY);
    let text_top = top + (STEP_BAR_H - title_style.line_height()) / 2.0;
    let title = format!("Step {}: {}", step.step_number, step.title);
    let title_w = w - BADGE_W - 12.0;
    let font = ctx.fonts().get(title_style.weight);
    // One line in the bar; an overlong title is repeated in full below it.
    let first = wrap_text(&title, title_w, title_style.size, font)
        .into_iter()
        .next()
        .map(|l| l.text)
        .unwrap_or_default();
    let truncated = first.len() < title.len();
    ctx.draw_text(x + 6.0, text_top, &first, title_style);

    let level = step.risk_level;
    let badge_style = TextStyle::new(7.5, Weight::Bold, level.text_color());
    let badge_h = line_height(badge_style.size) + 4.0;
    let badge_x = x + w - BADGE_W - 4.0;
    let badge_top = top + (STEP_BAR_H - badge_h) / 2.0;
    ctx.fill_rect(badge_x, badge_top, BADGE_W, badge_h, level.color());
    ctx.draw_text_aligned(
        badge_x,
        BADGE_W,
        badge_top + 2.0,
        &format!("{} RISK", level.label().to_uppercase()),
        badge_style,
        Alignment::Center,
    );
    ctx.advance(STEP_BAR_H + 6.0);

    if truncated {
        let x = ctx.left() + INDENT;
        let w = ctx.content_width() - INDENT;
        ctx.paragraph(x, w, &step.title, TextStyle::BODY_BOLD);
    }
}

fn labelled_line(ctx: &mut ReportContext, label: &str, value: &str, style: TextStyle) {
    let x = ctx.left() + INDENT;
    let w = ctx.content_width() - INDENT;
    ctx.paragraph(x, w, &format!("{label} {value}"), style);
}

/// "Hazard (rating Band)" lines for the hazards arising in one step.
fn hazard_lines(risks: &[&RiskEntry]) -> Vec<String> {
    risks
        .iter()
        .map(|r| {
            let rating = r.rating();
            format!("{} ({} {})", r.hazard, rating.value(), rating.band().label())
        })
        .collect()
}

fn render_step(ctx: &mut ReportContext, step: &MethodStep, dependencies: &[u32], risks: &[&RiskEntry]) {
    let lead = step_lead_height(ctx, step);
    ctx.break_if_needed(lead);
    step_bar(ctx, step);

    if !step.description.is_empty() {
        let x = ctx.left() + INDENT;
        let w = ctx.content_width() - INDENT;
        ctx.paragraph(x, w, &step.description, TextStyle::BODY);
        ctx.advance(3.0);
    }
    if !step.equipment.is_empty() {
        labelled_line(ctx, "Equipment:", &step.equipment.join(", "), TextStyle::BODY);
        ctx.advance(2.0);
    }
    if !step.safety_requirements.is_empty() {
        labelled_line(ctx, "Safety requirements:", "", TextStyle::BODY_BOLD);
        bullets(ctx, &step.safety_requirements, INDENT);
    }
    if !risks.is_empty() {
        labelled_line(ctx, "Hazards:", "", TextStyle::BODY_BOLD);
        bullets(ctx, &hazard_lines(risks), INDENT);
    }
    if !dependencies.is_empty() {
        let style = TextStyle::new(8.0, Weight::Regular, MUTED);
        labelled_line(ctx, "Depends on:", &step_list(dependencies), style);
    }
    ctx.advance(BLOCK_GAP);
}

pub(crate) fn render(ctx: &mut ReportContext, data: &RamsData, _options: &GenerateOptions) -> Result<(), Error> {
    if data.steps.is_empty() {
        body_text(ctx, "No method steps recorded.");
        return Ok(());
    }

    let graph = StepGraph::build(&data.steps)?;
    for (step, dep) in graph.forward_references() {
        log::warn!("Step {step} depends on later step {dep}");
    }

    let order = graph.execution_order();
    let numbered: Vec<usize> = (0..graph.len()).collect();
    if order != numbered {
        let sequence: Vec<u32> = order.iter().map(|&i| graph.step_number(i)).collect();
        body_text(
            ctx,
            &format!(
                "Steps are listed by number. Dependencies require this sequence of work: {}.",
                step_list(&sequence)
            ),
        );
    }

    for (i, step) in data.steps.iter().enumerate() {
        let deps: Vec<u32> = graph
            .dependencies(i)
            .iter()
            .map(|&d| graph.step_number(d))
            .collect();
        render_step(ctx, step, &deps, &data.risks_for_step(step.step_number));
    }
    log::debug!("work activities: {} steps", data.steps.len());
    Ok(())
}
