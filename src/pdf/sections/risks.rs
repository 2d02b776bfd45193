use crate::error::Error;
use crate::model::{RamsData, RiskEntry};
use crate::options::GenerateOptions;
use crate::pdf::context::ReportContext;
use crate::pdf::table::{Cell, Column, Table, render_table};
use crate::risk::RiskRating;

use super::body_text;

/// Marks a residual rating above the initial rating.
const RESIDUAL_FLAG: &str = "!";

fn rating_cell(rating: RiskRating, flagged: bool) -> Cell {
    let band = rating.band();
    let text = if flagged {
        format!("{} {RESIDUAL_FLAG}\n{}", rating.value(), band.label())
    } else {
        format!("{}\n{}", rating.value(), band.label())
    };
    Cell::new(text).bold().shaded(band.color(), band.text_color())
}

fn risk_row(index: usize, risk: &RiskEntry) -> Vec<Cell> {
    let (rl, rs) = risk.residual_factors();
    let hazard = match risk.linked_step {
        0 => risk.hazard.clone(),
        step => format!("{}\n(Step {step})", risk.hazard),
    };
    let controls = if risk.regulation.is_empty() {
        risk.controls.clone()
    } else {
        format!("{}\nRegulation: {}", risk.controls, risk.regulation)
    };
    vec![
        Cell::new((index + 1).to_string()),
        Cell::new(hazard).bold(),
        Cell::new(risk.who_at_risk.as_str()),
        Cell::new(risk.likelihood.to_string()),
        Cell::new(risk.severity.to_string()),
        rating_cell(risk.rating(), false),
        Cell::new(controls),
        Cell::new(rl.to_string()),
        Cell::new(rs.to_string()),
        rating_cell(risk.residual_rating(), risk.residual_exceeds_initial()),
    ]
}

pub(crate) fn risk_table(data: &RamsData, rows_per_chunk: usize) -> Table {
    let mut table = Table::new(vec![
        Column::centered("#", 0.35),
        Column::new("Hazard", 2.0),
        Column::new("Who", 1.1),
        Column::centered("L", 0.35),
        Column::centered("S", 0.35),
        Column::centered("Risk", 0.95),
        Column::new("Control Measures", 3.4),
        Column::centered("RL", 0.4),
        Column::centered("RS", 0.4),
        Column::centered("Residual", 0.95),
    ]);
    table.rows = data
        .risks
        .iter()
        .enumerate()
        .map(|(i, r)| risk_row(i, r))
        .collect();
    table.rows_per_chunk = rows_per_chunk;
    table
}

pub(crate) fn render(ctx: &mut ReportContext, data: &RamsData, options: &GenerateOptions) -> Result<(), Error> {
    if data.risks.is_empty() {
        body_text(ctx, "No hazards recorded.");
        return Ok(());
    }

    render_table(ctx, &risk_table(data, options.rows_per_table_page));
    ctx.advance(6.0);

    let flagged = data.risks.iter().filter(|r| r.residual_exceeds_initial()).count();
    let mut key = "L = likelihood, S = severity, Risk = L \u{00D7} S. RL and RS are the residual scores once control measures are in place.".to_string();
    if flagged > 0 {
        key.push_str(&format!(
            " \"{RESIDUAL_FLAG}\" marks a residual rating above the initial rating ({flagged} hazard{}).",
            if flagged == 1 { "" } else { "s" }
        ));
    }
    body_text(ctx, &key);
    log::debug!("detailed risk table: {} rows, {flagged} flagged", data.risks.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_above_initial_is_flagged() {
        let risk = RiskEntry::new("Manual handling", 2, 2, "Team lift").with_residual(3, 3);
        let row = risk_row(0, &risk);
        assert_eq!(row.len(), 10);
        assert_eq!(row[5].text, "4\nLow");
        assert_eq!(row[9].text, "9 !\nMedium");
    }

    #[test]
    fn step_link_and_regulation_are_shown() {
        let risk = RiskEntry::new("Contact with live parts", 3, 5, "Safe isolation procedure")
            .linked_to(2)
            .with_regulation("EWR 1989 Reg 14");
        let row = risk_row(0, &risk);
        assert_eq!(row[1].text, "Contact with live parts\n(Step 2)");
        assert_eq!(row[6].text, "Safe isolation procedure\nRegulation: EWR 1989 Reg 14");

        let general = risk_row(1, &RiskEntry::new("Site traffic", 2, 4, "Banksman"));
        assert_eq!(general[1].text, "Site traffic");
        assert_eq!(general[6].text, "Banksman");
    }

    #[test]
    fn columns_match_header_order() {
        let table = risk_table(&RamsData::default(), 8);
        let labels: Vec<&str> = table.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["#", "Hazard", "Who", "L", "S", "Risk", "Control Measures", "RL", "RS", "Residual"]
        );
        assert_eq!(table.rows_per_chunk, 8);
    }
}
