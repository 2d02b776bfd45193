use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::risk::{RiskLevel, RiskRating, clamp_factor};

pub const NOT_SPECIFIED: &str = "Not specified";

const DATE_DISPLAY: &str = "%d/%m/%Y";
const DATE_INPUTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectInfo {
    pub project_name: String,
    pub location: String,
    pub client: String,
    pub principal_contractor: String,
    pub job_reference: String,
    pub start_date: String,
    pub duration: String,
    pub assessment_date: String,
    pub review_date: String,
    pub prepared_by: String,
    pub document_version: String,
    pub scope_of_work: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskEntry {
    pub hazard: String,
    pub who_at_risk: String,
    pub likelihood: u8,
    pub severity: u8,
    #[serde(alias = "controlMeasures")]
    pub controls: String,
    pub residual_likelihood: Option<u8>,
    pub residual_severity: Option<u8>,
    /// Method step the hazard arises in; 0 for general site hazards.
    #[serde(alias = "linkedToStep")]
    pub linked_step: u32,
    /// Legislation the control measures satisfy, e.g. "EWR 1989 Reg 4(3)".
    pub regulation: String,
}

impl RiskEntry {
    pub fn new(hazard: &str, likelihood: u8, severity: u8, controls: &str) -> Self {
        RiskEntry {
            hazard: hazard.to_string(),
            likelihood,
            severity,
            controls: controls.to_string(),
            ..Default::default()
        }
    }

    pub fn with_residual(mut self, likelihood: u8, severity: u8) -> Self {
        self.residual_likelihood = Some(likelihood);
        self.residual_severity = Some(severity);
        self
    }

    pub fn linked_to(mut self, step: u32) -> Self {
        self.linked_step = step;
        self
    }

    pub fn with_regulation(mut self, regulation: &str) -> Self {
        self.regulation = regulation.to_string();
        self
    }

    pub fn rating(&self) -> RiskRating {
        RiskRating::new(self.likelihood, self.severity)
    }

    /// Missing residual factors fall back to the initial ones (no reduction claimed).
    pub fn residual_factors(&self) -> (u8, u8) {
        (
            self.residual_likelihood.unwrap_or(self.likelihood),
            self.residual_severity.unwrap_or(self.severity),
        )
    }

    pub fn residual_rating(&self) -> RiskRating {
        let (l, s) = self.residual_factors();
        RiskRating::new(l, s)
    }

    pub fn residual_exceeds_initial(&self) -> bool {
        self.residual_rating() > self.rating()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MethodStep {
    pub step_number: u32,
    pub title: String,
    pub description: String,
    pub risk_level: RiskLevel,
    pub safety_requirements: Vec<String>,
    pub equipment: Vec<String>,
    pub dependencies: Vec<u32>,
}

impl MethodStep {
    pub fn new(step_number: u32, title: &str, description: &str) -> Self {
        MethodStep {
            step_number,
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }
}

/// One item of personal protective equipment. In JSON either an object or a
/// bare item name, which is taken as mandatory with no stated standard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "PpeInput", rename_all = "camelCase")]
pub struct PpeItem {
    pub ppe_type: String,
    pub standard: String,
    pub mandatory: bool,
    pub purpose: String,
}

impl PpeItem {
    pub fn new(ppe_type: &str) -> Self {
        PpeItem {
            ppe_type: ppe_type.to_string(),
            standard: String::new(),
            mandatory: true,
            purpose: String::new(),
        }
    }

    pub fn with_standard(mut self, standard: &str) -> Self {
        self.standard = standard.to_string();
        self
    }

    pub fn with_purpose(mut self, purpose: &str) -> Self {
        self.purpose = purpose.to_string();
        self
    }

    /// Situational rather than required for the whole job.
    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PpeInput {
    Name(String),
    Detailed(PpeFields),
}

#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PpeFields {
    #[serde(alias = "item", alias = "name")]
    ppe_type: String,
    standard: String,
    mandatory: bool,
    purpose: String,
}

impl Default for PpeFields {
    fn default() -> Self {
        PpeFields {
            ppe_type: String::new(),
            standard: String::new(),
            mandatory: true,
            purpose: String::new(),
        }
    }
}

impl From<PpeInput> for PpeItem {
    fn from(input: PpeInput) -> Self {
        match input {
            PpeInput::Name(name) => PpeItem::new(&name),
            PpeInput::Detailed(f) => PpeItem {
                ppe_type: f.ppe_type,
                standard: f.standard,
                mandatory: f.mandatory,
                purpose: f.purpose,
            },
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmergencyArrangements {
    pub first_aid: String,
    pub nearest_hospital: String,
    pub emergency_contact: String,
    pub assembly_point: String,
    pub fire_procedure: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Signatory {
    pub role: String,
    pub name: String,
    pub position: String,
    pub date: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Worker {
    pub name: String,
    pub company: String,
}

/// Caller-supplied content of one report. Every field may be missing in the
/// JSON input.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RamsData {
    pub project: ProjectInfo,
    pub risks: Vec<RiskEntry>,
    #[serde(alias = "methodSteps")]
    pub steps: Vec<MethodStep>,
    pub ppe: Vec<PpeItem>,
    pub emergency: EmergencyArrangements,
    /// Step-by-step actions for an incident, in order.
    pub emergency_procedures: Vec<String>,
    pub compliance_regulations: Vec<String>,
    pub signatories: Vec<Signatory>,
    pub workers: Vec<Worker>,
}

fn or_placeholder(value: &str, field: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        log::debug!("{field} missing, using placeholder");
        NOT_SPECIFIED.to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_INPUTS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_DISPLAY).to_string()
}

/// Normalizes a date for display. Missing or unparseable input becomes `today`.
fn date_or_today(value: &str, today: NaiveDate, field: &str) -> String {
    if value.trim().is_empty() {
        return format_date(today);
    }
    match parse_date(value) {
        Some(date) => format_date(date),
        None => {
            log::warn!("{field}: unrecognised date {value:?}, using {}", format_date(today));
            format_date(today)
        }
    }
}

/// Normalizes an optional date: blank stays blank (a field to fill in by hand).
fn optional_date(value: &str, field: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    match parse_date(value) {
        Some(date) => format_date(date),
        None => {
            log::warn!("{field}: unrecognised date {value:?}, leaving as entered");
            value.trim().to_string()
        }
    }
}

fn clamp_logged(value: u8, what: &str, hazard: &str) -> u8 {
    let clamped = clamp_factor(value);
    if clamped != value {
        log::warn!("{hazard}: {what} {value} outside 1..=5, clamped to {clamped}");
    }
    clamped
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_ppe(items: &[PpeItem]) -> Vec<PpeItem> {
    items
        .iter()
        .filter(|p| {
            let keep = !p.ppe_type.trim().is_empty();
            if !keep {
                log::warn!("PPE item without a type dropped");
            }
            keep
        })
        .map(|p| PpeItem {
            ppe_type: p.ppe_type.trim().to_string(),
            standard: p.standard.trim().to_string(),
            mandatory: p.mandatory,
            purpose: p.purpose.trim().to_string(),
        })
        .collect()
}

impl ProjectInfo {
    fn sanitized(&self, today: NaiveDate) -> ProjectInfo {
        ProjectInfo {
            project_name: or_placeholder(&self.project_name, "project name"),
            location: or_placeholder(&self.location, "location"),
            client: or_placeholder(&self.client, "client"),
            principal_contractor: or_placeholder(&self.principal_contractor, "principal contractor"),
            job_reference: or_placeholder(&self.job_reference, "job reference"),
            start_date: date_or_today(&self.start_date, today, "start date"),
            duration: or_placeholder(&self.duration, "duration"),
            assessment_date: date_or_today(&self.assessment_date, today, "assessment date"),
            review_date: if self.review_date.trim().is_empty() {
                NOT_SPECIFIED.to_string()
            } else {
                optional_date(&self.review_date, "review date")
            },
            prepared_by: or_placeholder(&self.prepared_by, "prepared by"),
            document_version: if self.document_version.trim().is_empty() {
                "1.0".to_string()
            } else {
                self.document_version.trim().to_string()
            },
            scope_of_work: or_placeholder(&self.scope_of_work, "scope of work"),
        }
    }
}

impl RiskEntry {
    /// `renumber` maps input step numbers to sanitized ones.
    fn sanitized(
        &self,
        index: usize,
        strict_residual: bool,
        renumber: &HashMap<u32, u32>,
    ) -> Result<RiskEntry, Error> {
        let hazard = if self.hazard.trim().is_empty() {
            log::warn!("risk {} has no hazard text", index + 1);
            "Unspecified hazard".to_string()
        } else {
            self.hazard.trim().to_string()
        };
        let linked_step = match self.linked_step {
            0 => 0,
            n => *renumber.get(&n).ok_or_else(|| {
                Error::InvalidInput(format!("{hazard}: linked to unknown step {n}"))
            })?,
        };
        let likelihood = clamp_logged(self.likelihood, "likelihood", &hazard);
        let severity = clamp_logged(self.severity, "severity", &hazard);
        let (rl, rs) = self.residual_factors();
        let entry = RiskEntry {
            who_at_risk: if self.who_at_risk.trim().is_empty() {
                "Operatives".to_string()
            } else {
                self.who_at_risk.trim().to_string()
            },
            likelihood,
            severity,
            controls: or_placeholder(&self.controls, "control measures"),
            residual_likelihood: Some(clamp_logged(rl, "residual likelihood", &hazard)),
            residual_severity: Some(clamp_logged(rs, "residual severity", &hazard)),
            linked_step,
            regulation: self.regulation.trim().to_string(),
            hazard,
        };

        if entry.residual_exceeds_initial() {
            let msg = format!(
                "{}: residual rating {} exceeds initial rating {}",
                entry.hazard,
                entry.residual_rating(),
                entry.rating()
            );
            if strict_residual {
                return Err(Error::InvalidInput(msg));
            }
            log::warn!("{msg}");
        }
        Ok(entry)
    }
}

/// Renumbers steps 1..=N by their stated number (unnumbered steps keep input
/// order after the numbered ones) and remaps dependencies to the new numbers.
/// Also returns the old-to-new number map.
fn sanitize_steps(steps: &[MethodStep]) -> Result<(Vec<MethodStep>, HashMap<u32, u32>), Error> {
    let mut order: Vec<usize> = (0..steps.len()).collect();
    order.sort_by_key(|&i| match steps[i].step_number {
        0 => u32::MAX,
        n => n,
    });

    let mut renumber: HashMap<u32, u32> = HashMap::new();
    for (new_idx, &old_idx) in order.iter().enumerate() {
        let old = steps[old_idx].step_number;
        let new = new_idx as u32 + 1;
        if old != 0 {
            match renumber.entry(old) {
                Entry::Vacant(slot) => {
                    slot.insert(new);
                }
                Entry::Occupied(_) => {
                    log::warn!("duplicate step number {old}; dependencies refer to the first");
                }
            }
        }
        if old != new {
            log::debug!("step {old} renumbered to {new}");
        }
    }

    let sanitized = order
        .iter()
        .enumerate()
        .map(|(new_idx, &old_idx)| {
            let step = &steps[old_idx];
            let number = new_idx as u32 + 1;
            let dependencies = step
                .dependencies
                .iter()
                .map(|dep| {
                    renumber.get(dep).copied().ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "step {} depends on unknown step {dep}",
                            step.step_number
                        ))
                    })
                })
                .collect::<Result<Vec<u32>, Error>>()?;
            Ok(MethodStep {
                step_number: number,
                title: if step.title.trim().is_empty() {
                    format!("Step {number}")
                } else {
                    step.title.trim().to_string()
                },
                description: or_placeholder(&step.description, "step description"),
                risk_level: step.risk_level,
                safety_requirements: clean_list(&step.safety_requirements),
                equipment: clean_list(&step.equipment),
                dependencies,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok((sanitized, renumber))
}

fn default_signatories(prepared_by: &str) -> Vec<Signatory> {
    let named = |role: &str, name: &str| Signatory {
        role: role.to_string(),
        name: name.to_string(),
        ..Default::default()
    };
    let prepared = if prepared_by == NOT_SPECIFIED { "" } else { prepared_by };
    vec![
        named("Prepared by", prepared),
        named("Reviewed by", ""),
        named("Approved by", ""),
    ]
}

impl RamsData {
    /// Fills placeholders, clamps scores, renumbers steps. Structural defects
    /// (unknown step references, strict residual violations) are errors.
    pub fn sanitized(&self, today: NaiveDate, strict_residual: bool) -> Result<RamsData, Error> {
        let project = self.project.sanitized(today);
        let (steps, renumber) = sanitize_steps(&self.steps)?;

        let risks = self
            .risks
            .iter()
            .enumerate()
            .map(|(i, r)| r.sanitized(i, strict_residual, &renumber))
            .collect::<Result<Vec<_>, _>>()?;

        let signatories = if self.signatories.is_empty() {
            default_signatories(&project.prepared_by)
        } else {
            self.signatories
                .iter()
                .map(|s| Signatory {
                    role: or_placeholder(&s.role, "signatory role"),
                    name: s.name.trim().to_string(),
                    position: s.position.trim().to_string(),
                    date: optional_date(&s.date, "signature date"),
                })
                .collect()
        };

        let emergency = EmergencyArrangements {
            first_aid: or_placeholder(&self.emergency.first_aid, "first aid"),
            nearest_hospital: or_placeholder(&self.emergency.nearest_hospital, "nearest hospital"),
            emergency_contact: or_placeholder(&self.emergency.emergency_contact, "emergency contact"),
            assembly_point: or_placeholder(&self.emergency.assembly_point, "assembly point"),
            fire_procedure: or_placeholder(&self.emergency.fire_procedure, "fire procedure"),
        };

        Ok(RamsData {
            project,
            risks,
            steps,
            ppe: clean_ppe(&self.ppe),
            emergency,
            emergency_procedures: clean_list(&self.emergency_procedures),
            compliance_regulations: clean_list(&self.compliance_regulations),
            signatories,
            workers: self
                .workers
                .iter()
                .filter(|w| !w.name.trim().is_empty())
                .map(|w| Worker {
                    name: w.name.trim().to_string(),
                    company: w.company.trim().to_string(),
                })
                .collect(),
        })
    }

    /// Risks that arise in step `number`. General hazards (step 0) belong to
    /// the first step once any hazard in the report is linked to a step.
    pub fn risks_for_step(&self, number: u32) -> Vec<&RiskEntry> {
        let linking = self.risks.iter().any(|r| r.linked_step != 0);
        if !linking {
            return Vec::new();
        }
        let first = self.steps.first().map(|s| s.step_number);
        self.risks
            .iter()
            .filter(|r| r.linked_step == number || (r.linked_step == 0 && first == Some(number)))
            .collect()
    }

    /// Highest initial and residual ratings, if there are any risks.
    pub fn peak_ratings(&self) -> Option<(RiskRating, RiskRating)> {
        let initial = self.risks.iter().map(RiskEntry::rating).max()?;
        let residual = self.risks.iter().map(RiskEntry::residual_rating).max()?;
        Some((initial, residual))
    }
}
