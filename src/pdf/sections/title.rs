use crate::error::Error;
use crate::fonts::Weight;
use crate::model::RamsData;
use crate::options::{GenerateOptions, ReportKind};
use crate::risk::RiskRating;

use crate::pdf::context::{ACCENT, HEADER_FILL, PRIMARY, RULE, ReportContext, TEXT, TextStyle, WHITE};

const BANNER_H: f32 = 120.0;
const LABEL_W: f32 = 130.0;

fn describe(rating: RiskRating) -> String {
    format!("{} ({})", rating.value(), rating.band())
}

pub(crate) fn render(ctx: &mut ReportContext, data: &RamsData, options: &GenerateOptions) -> Result<(), Error> {
    let x = ctx.left();
    let w = ctx.content_width();
    let top = ctx.y();

    ctx.fill_rect(x, top, w, BANNER_H, PRIMARY);
    ctx.fill_rect(x, top + BANNER_H, w, 4.0, ACCENT);

    ctx.advance(16.0);
    if let Some(company) = options.company_name.as_deref().filter(|c| !c.trim().is_empty()) {
        ctx.paragraph(x + 16.0, w - 32.0, company, TextStyle::new(10.0, Weight::Bold, WHITE));
        ctx.advance(10.0);
    }
    let title_style = TextStyle::new(22.0, Weight::Bold, WHITE);
    ctx.paragraph(x + 16.0, w - 32.0, options.kind.title(), title_style);
    let below_banner = top + BANNER_H + 28.0 - ctx.y();
    ctx.advance(below_banner.max(0.0));

    let name_style = TextStyle::new(18.0, Weight::Bold, PRIMARY);
    ctx.paragraph(x, w, &data.project.project_name, name_style);
    ctx.advance(10.0);

    let p = &data.project;
    let details: [(&str, &str); 7] = [
        ("Location", p.location.as_str()),
        ("Client", p.client.as_str()),
        ("Job reference", p.job_reference.as_str()),
        ("Assessment date", p.assessment_date.as_str()),
        ("Review date", p.review_date.as_str()),
        ("Document version", p.document_version.as_str()),
        ("Prepared by", p.prepared_by.as_str()),
    ];
    for (label, value) in details {
        ctx.break_if_needed(TextStyle::BODY.line_height());
        ctx.draw_text(x, ctx.y(), label, TextStyle::BODY_BOLD);
        ctx.paragraph(x + LABEL_W, w - LABEL_W, value, TextStyle::BODY);
        ctx.advance(3.0);
    }
    ctx.advance(16.0);

    let mut summary = vec![format!("Method steps: {}", data.steps.len())];
    if options.kind == ReportKind::Rams {
        summary.insert(0, format!("Hazards identified: {}", data.risks.len()));
        match data.peak_ratings() {
            Some((initial, residual)) => {
                summary.push(format!("Highest initial risk: {}", describe(initial)));
                summary.push(format!("Highest residual risk: {}", describe(residual)));
            }
            None => summary.push("Highest risk: none recorded".to_string()),
        }
    }

    let style = TextStyle::new(10.0, Weight::Regular, TEXT);
    let heading = TextStyle::SUBHEADING;
    let box_h = heading.line_height() + 6.0 + summary.len() as f32 * style.line_height() + 20.0;
    ctx.break_if_needed(box_h);
    let box_top = ctx.y();
    ctx.fill_rect(x, box_top, w, box_h, HEADER_FILL);
    ctx.stroke_rect(x, box_top, w, box_h, RULE, 0.75);
    let mut line_top = box_top + 10.0;
    ctx.draw_text(x + 12.0, line_top, "Summary", heading);
    line_top += heading.line_height() + 6.0;
    for line in &summary {
        ctx.draw_text(x + 12.0, line_top, line, style);
        line_top += style.line_height();
    }
    ctx.advance(box_h);
    log::debug!("title page: {} summary lines", summary.len());
    Ok(())
}
