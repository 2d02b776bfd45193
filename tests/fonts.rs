mod common;

use rams_pdf::{GenerateOptions, Worker, generate};

fn polish_crew() -> rams_pdf::RamsData {
    let mut data = common::sample(9);
    data.workers.push(Worker {
        name: "\u{141}ukasz Wi\u{15b}niewski".to_string(),
        company: "B\u{142}ysk Elektro Sp. z o.o.".to_string(),
    });
    data
}

#[test]
fn embedded_fonts_are_subset_type0() {
    let _ = env_logger::try_init();
    let report = generate(&polish_crew(), &common::embedded_font_options()).expect("generate");
    common::write_output("embedded_fonts", &report);

    assert_eq!(common::lopdf_page_count(&report.bytes), report.page_count);
    assert_eq!(common::page_font_subtypes(&report.bytes, 1), vec!["Type0", "Type0"]);
    let full_font = std::fs::metadata(common::REGULAR_FONT).unwrap().len() as usize;
    assert!(report.bytes.len() < full_font, "fonts should be subset");
    assert!(!common::pages_containing(&report, "\u{141}ukasz Wi\u{15b}niewski").is_empty());
}

#[test]
fn embedded_font_output_is_reproducible() {
    let data = polish_crew();
    let opts = common::embedded_font_options();
    let a = generate(&data, &opts).unwrap();
    let b = generate(&data, &opts).unwrap();
    assert_eq!(a.page_count, b.page_count);
    assert_eq!(a.bytes.len(), b.bytes.len());
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn embedded_layout_stays_in_content_area() {
    let opts = common::embedded_font_options();
    let report = generate(&common::sample(25), &opts).unwrap();
    let bottom = opts.geometry.content_bottom();
    assert!(report.pages.iter().all(|p| p.lowest_content_y <= bottom + 0.01));
}

#[test]
fn unparseable_font_falls_back_to_helvetica() {
    let opts = GenerateOptions {
        font: Some("tests/fixtures/DejaVu-LICENSE".into()),
        ..common::options()
    };
    let report = generate(&common::sample(2), &opts).expect("fallback, not an error");
    assert_eq!(common::page_font_subtypes(&report.bytes, 1), vec!["Type1", "Type1"]);
}
