use crate::error::Error;
use crate::model::RamsData;
use crate::options::{GenerateOptions, ReportKind};
use crate::pdf::context::ReportContext;
use crate::pdf::sections;

/// The report sections, in the order of the full RAMS document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionId {
    TitlePage,
    ProjectInfo,
    WorkActivities,
    RiskMatrix,
    DetailedRiskTable,
    SafetyRequirements,
    Authorization,
    WorkerSignOn,
}

/// Where a section begins relative to the content before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// A page of its own, without the header band.
    TitlePage,
    NewPage,
    Flow,
}

impl SectionId {
    pub fn title(self) -> &'static str {
        match self {
            SectionId::TitlePage => "Cover Page",
            SectionId::ProjectInfo => "Project Information",
            SectionId::WorkActivities => "Work Activities",
            SectionId::RiskMatrix => "Risk Matrix",
            SectionId::DetailedRiskTable => "Detailed Risk Assessment",
            SectionId::SafetyRequirements => "Safety Requirements",
            SectionId::Authorization => "Authorization",
            SectionId::WorkerSignOn => "Worker Sign-On",
        }
    }

    pub(crate) fn placement(self) -> Placement {
        match self {
            SectionId::TitlePage => Placement::TitlePage,
            SectionId::ProjectInfo | SectionId::DetailedRiskTable | SectionId::WorkerSignOn => {
                Placement::NewPage
            }
            _ => Placement::Flow,
        }
    }

    fn renderer(self) -> RenderFn {
        match self {
            SectionId::TitlePage => sections::title::render,
            SectionId::ProjectInfo => sections::project::render,
            SectionId::WorkActivities => sections::activities::render,
            SectionId::RiskMatrix => sections::matrix::render,
            SectionId::DetailedRiskTable => sections::risks::render,
            SectionId::SafetyRequirements => sections::safety::render,
            SectionId::Authorization => sections::signoff::render_authorization,
            SectionId::WorkerSignOn => sections::signoff::render_sign_on,
        }
    }
}

pub(crate) type RenderFn = fn(&mut ReportContext, &RamsData, &GenerateOptions) -> Result<(), Error>;

pub struct SectionSpec {
    pub id: SectionId,
    pub title: String,
    render: RenderFn,
}

impl SectionSpec {
    pub fn new(id: SectionId) -> Self {
        SectionSpec {
            id,
            title: id.title().to_string(),
            render: id.renderer(),
        }
    }

    pub(crate) fn render(&self, ctx: &mut ReportContext, data: &RamsData, options: &GenerateOptions) -> Result<(), Error> {
        (self.render)(ctx, data, options)
    }
}

/// Ordered list of sections a report is built from.
pub struct Pipeline {
    sections: Vec<SectionSpec>,
}

impl Pipeline {
    pub fn from_ids(ids: &[SectionId]) -> Self {
        Pipeline {
            sections: ids.iter().copied().map(SectionSpec::new).collect(),
        }
    }

    pub fn rams() -> Self {
        Pipeline::from_ids(&[
            SectionId::TitlePage,
            SectionId::ProjectInfo,
            SectionId::WorkActivities,
            SectionId::RiskMatrix,
            SectionId::DetailedRiskTable,
            SectionId::SafetyRequirements,
            SectionId::Authorization,
            SectionId::WorkerSignOn,
        ])
    }

    pub fn method_statement() -> Self {
        Pipeline::from_ids(&[
            SectionId::TitlePage,
            SectionId::ProjectInfo,
            SectionId::WorkActivities,
            SectionId::SafetyRequirements,
            SectionId::Authorization,
        ])
    }

    pub fn for_kind(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Rams => Pipeline::rams(),
            ReportKind::MethodStatement => Pipeline::method_statement(),
        }
    }

    pub fn ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id).collect()
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(SectionId) -> bool) {
        self.sections.retain(|s| keep(s.id));
    }

    pub fn push(&mut self, section: SectionSpec) {
        self.sections.push(section);
    }

    /// Replaces a section's heading (and its TOC entry).
    pub fn rename(&mut self, id: SectionId, title: &str) {
        for section in self.sections.iter_mut().filter(|s| s.id == id) {
            section.title = title.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rams_order_is_fixed() {
        assert_eq!(
            Pipeline::rams().ids(),
            vec![
                SectionId::TitlePage,
                SectionId::ProjectInfo,
                SectionId::WorkActivities,
                SectionId::RiskMatrix,
                SectionId::DetailedRiskTable,
                SectionId::SafetyRequirements,
                SectionId::Authorization,
                SectionId::WorkerSignOn,
            ]
        );
    }

    #[test]
    fn method_statement_omits_risk_sections() {
        let ids = Pipeline::for_kind(ReportKind::MethodStatement).ids();
        assert!(!ids.contains(&SectionId::RiskMatrix));
        assert!(!ids.contains(&SectionId::DetailedRiskTable));
        assert!(!ids.contains(&SectionId::WorkerSignOn));
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn retain_and_rename() {
        let mut p = Pipeline::rams();
        p.retain(|id| id != SectionId::RiskMatrix);
        p.rename(SectionId::WorkActivities, "Sequence of Works");
        assert_eq!(p.len(), 7);
        assert_eq!(p.sections()[2].title, "Sequence of Works");
    }
}
