#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use rams_pdf::{
    EmergencyArrangements, GenerateOptions, MethodStep, PpeItem, ProjectInfo, RamsData, Report,
    RiskEntry, RiskLevel, Worker,
};

/// Fixed generation time so repeated runs produce identical bytes.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 18, 9, 30, 0).unwrap()
}

pub fn options() -> GenerateOptions {
    GenerateOptions {
        generated_at: Some(fixed_time()),
        company_name: Some("Northgate Building Services Ltd".to_string()),
        ..Default::default()
    }
}

pub fn project() -> ProjectInfo {
    ProjectInfo {
        project_name: "Riverside Clinic Rewire".to_string(),
        location: "14 Quay Street, Bristol".to_string(),
        client: "Avon Health Trust".to_string(),
        principal_contractor: "Northgate Building Services Ltd".to_string(),
        job_reference: "NBS-2291".to_string(),
        start_date: "2024-04-02".to_string(),
        duration: "3 weeks".to_string(),
        prepared_by: "J. Okafor".to_string(),
        scope_of_work: "Strip out and replace final circuits on the ground floor, \
            install new distribution board DB-G2 and test and certify the installation."
            .to_string(),
        ..Default::default()
    }
}

pub fn step(n: u32, title: &str, deps: &[u32]) -> MethodStep {
    MethodStep {
        risk_level: if n % 3 == 0 { RiskLevel::High } else { RiskLevel::Medium },
        safety_requirements: vec!["Permit to work in place".to_string(), format!("Briefing for step {n}")],
        equipment: vec!["Voltage indicator".to_string(), "Lock-off kit".to_string()],
        dependencies: deps.to_vec(),
        ..MethodStep::new(
            n,
            title,
            "Carry out the task as briefed, keep the work area barriered and report any \
             defects to the supervisor before continuing.",
        )
    }
}

pub fn risks(count: usize) -> Vec<RiskEntry> {
    (0..count)
        .map(|i| {
            let l = (i % 5) as u8 + 1;
            let s = ((i / 5) % 5) as u8 + 1;
            RiskEntry {
                who_at_risk: "Operatives, visitors".to_string(),
                ..RiskEntry::new(
                    &format!("Hazard {}", i + 1),
                    l,
                    s,
                    "Trained operatives only; barriers and signage in place.",
                )
                .with_residual(1, s)
            }
        })
        .collect()
}

/// A complete report input with `risk_count` risks.
pub fn sample(risk_count: usize) -> RamsData {
    RamsData {
        project: project(),
        risks: risks(risk_count),
        steps: vec![
            step(1, "Site set-up and isolation", &[]),
            step(2, "Strip out existing circuits", &[1]),
            step(3, "Install distribution board", &[1]),
            step(4, "Install final circuits", &[2, 3]),
            step(5, "Test and commission", &[4]),
        ],
        ppe: vec![
            PpeItem::new("Safety boots").with_standard("BS EN ISO 20345"),
            PpeItem::new("Hi-vis vest").with_standard("BS EN ISO 20471"),
            PpeItem::new("Insulated gloves")
                .with_standard("BS EN 60903 Class 0")
                .with_purpose("Protection when proving dead"),
        ],
        emergency: EmergencyArrangements {
            first_aid: "First aider: M. Patel, site office".to_string(),
            nearest_hospital: "Bristol Royal Infirmary".to_string(),
            emergency_contact: "Site manager 07700 900123".to_string(),
            assembly_point: "Car park, north gate".to_string(),
            fire_procedure: "Raise the alarm, evacuate to the assembly point, call 999.".to_string(),
        },
        workers: vec![
            Worker {
                name: "A. Fitter".to_string(),
                company: "Northgate".to_string(),
            },
            Worker {
                name: "B. Mate".to_string(),
                company: "Northgate".to_string(),
            },
        ],
        ..Default::default()
    }
}

pub const REGULAR_FONT: &str = "tests/fixtures/DejaVuSans.ttf";
pub const BOLD_FONT: &str = "tests/fixtures/DejaVuSans-Bold.ttf";

/// `options()` with the DejaVu fixtures embedded.
pub fn embedded_font_options() -> GenerateOptions {
    GenerateOptions {
        font: Some(REGULAR_FONT.into()),
        bold_font: Some(BOLD_FONT.into()),
        ..options()
    }
}

/// Output directory: tests/output/<case>.pdf
pub fn write_output(case: &str, report: &Report) -> PathBuf {
    let dir = PathBuf::from("tests/output");
    fs::create_dir_all(&dir).expect("create tests/output");
    let path = dir.join(format!("{case}.pdf"));
    fs::write(&path, &report.bytes).expect("write pdf");
    path
}

pub fn lopdf_page_count(bytes: &[u8]) -> usize {
    lopdf::Document::load_mem(bytes)
        .expect("output parses as PDF")
        .get_pages()
        .len()
}

/// `Subtype` of every font on 1-based page `number`, in resource-name order.
pub fn page_font_subtypes(bytes: &[u8], number: u32) -> Vec<String> {
    let doc = lopdf::Document::load_mem(bytes).expect("output parses as PDF");
    let page_id = *doc.get_pages().get(&number).expect("page exists");
    doc.get_page_fonts(page_id)
        .expect("page fonts")
        .values()
        .filter_map(|font| font.get(b"Subtype").ok()?.as_name().ok())
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

/// 1-based numbers of pages whose text contains `needle`.
pub fn pages_containing(report: &Report, needle: &str) -> Vec<usize> {
    report
        .pages
        .iter()
        .filter(|p| p.contains(needle))
        .map(|p| p.number)
        .collect()
}
