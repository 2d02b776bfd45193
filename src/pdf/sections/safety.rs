use std::collections::HashSet;

use crate::error::Error;
use crate::model::{MethodStep, PpeItem, RamsData};
use crate::options::GenerateOptions;
use crate::pdf::context::ReportContext;
use crate::pdf::table::{Cell, Column, Table, render_table};

use super::{body_text, bullets, key_value_table, subheading};

/// Safety requirements across all steps, first occurrence wins. Comparison
/// ignores case and surrounding whitespace.
fn unique_requirements(steps: &[MethodStep]) -> Vec<String> {
    let mut seen = HashSet::new();
    steps
        .iter()
        .flat_map(|s| s.safety_requirements.iter())
        .map(|r| r.trim())
        .filter(|r| !r.is_empty() && seen.insert(r.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Mandatory items first, each group in input order.
pub(crate) fn ppe_table(items: &[PpeItem]) -> Table {
    let mut table = Table::new(vec![
        Column::new("PPE", 1.6),
        Column::new("Standard", 1.4),
        Column::centered("Required", 0.9),
        Column::new("Purpose", 2.4),
    ]);
    let (mandatory, optional): (Vec<&PpeItem>, Vec<&PpeItem>) = items.iter().partition(|p| p.mandatory);
    table.rows = mandatory
        .into_iter()
        .chain(optional)
        .map(|p| {
            vec![
                Cell::new(p.ppe_type.as_str()).bold(),
                Cell::new(p.standard.as_str()),
                Cell::new(if p.mandatory { "Mandatory" } else { "As required" }),
                Cell::new(p.purpose.as_str()),
            ]
        })
        .collect();
    table
}

pub(crate) fn render(ctx: &mut ReportContext, data: &RamsData, _options: &GenerateOptions) -> Result<(), Error> {
    subheading(ctx, "Personal Protective Equipment");
    if data.ppe.is_empty() {
        body_text(ctx, "No specific PPE recorded.");
    } else {
        render_table(ctx, &ppe_table(&data.ppe));
        ctx.advance(4.0);
    }

    let requirements = unique_requirements(&data.steps);
    if !requirements.is_empty() {
        subheading(ctx, "Safety Requirements by Activity");
        bullets(ctx, &requirements, 0.0);
    }

    subheading(ctx, "Emergency Arrangements");
    let e = &data.emergency;
    key_value_table(
        ctx,
        &[
            ("First aid", e.first_aid.as_str()),
            ("Nearest hospital", e.nearest_hospital.as_str()),
            ("Emergency contact", e.emergency_contact.as_str()),
            ("Assembly point", e.assembly_point.as_str()),
            ("Fire procedure", e.fire_procedure.as_str()),
        ],
    );

    if !data.emergency_procedures.is_empty() {
        subheading(ctx, "Emergency Procedures");
        let numbered: Vec<String> = data
            .emergency_procedures
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {p}", i + 1))
            .collect();
        for line in &numbered {
            body_text(ctx, line);
        }
    }

    if !data.compliance_regulations.is_empty() {
        subheading(ctx, "Compliance Regulations");
        bullets(ctx, &data.compliance_regulations, 0.0);
    }
    Ok(())
}
