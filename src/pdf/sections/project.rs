use crate::error::Error;
use crate::model::RamsData;
use crate::options::GenerateOptions;

use crate::pdf::context::ReportContext;
use super::{body_text, key_value_table, subheading};

pub(crate) fn render(ctx: &mut ReportContext, data: &RamsData, _options: &GenerateOptions) -> Result<(), Error> {
    let p = &data.project;
    key_value_table(
        ctx,
        &[
            ("Project name", p.project_name.as_str()),
            ("Location", p.location.as_str()),
            ("Client", p.client.as_str()),
            ("Principal contractor", p.principal_contractor.as_str()),
            ("Job reference", p.job_reference.as_str()),
            ("Start date", p.start_date.as_str()),
            ("Duration", p.duration.as_str()),
            ("Assessment date", p.assessment_date.as_str()),
            ("Review date", p.review_date.as_str()),
            ("Prepared by", p.prepared_by.as_str()),
            ("Document version", p.document_version.as_str()),
        ],
    );

    subheading(ctx, "Scope of Work");
    body_text(ctx, &p.scope_of_work);
    Ok(())
}
