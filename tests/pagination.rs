mod common;

use rams_pdf::{PageGeometry, RiskEntry, chunk_rows, generate};

fn assert_within_content_area(report: &rams_pdf::Report, geometry: &PageGeometry) {
    let bottom = geometry.content_bottom();
    for page in &report.pages {
        assert!(
            page.lowest_content_y <= bottom + 0.01,
            "page {} content reaches y={:.2}, limit {:.2}",
            page.number,
            page.lowest_content_y,
            bottom
        );
    }
}

#[test]
fn content_never_enters_footer_band() {
    let _ = env_logger::try_init();
    let opts = common::options();
    for risk_count in [0, 1, 7, 8, 9, 20, 45] {
        let report = generate(&common::sample(risk_count), &opts).expect("generate");
        assert_within_content_area(&report, &opts.geometry);
        assert_eq!(report.pages.len(), report.page_count);
    }
}

#[test]
fn every_page_carries_page_x_of_y() {
    let report = generate(&common::sample(20), &common::options()).unwrap();
    let total = report.page_count;
    for page in &report.pages {
        let label = format!("Page {} of {total}", page.number);
        assert!(page.contains(&label), "missing {label:?}");
    }
}

#[test]
fn detailed_table_repeats_header_per_chunk() {
    let report = generate(&common::sample(20), &common::options()).unwrap();
    assert_eq!(chunk_rows(20, 8).iter().map(|r| r.len()).collect::<Vec<_>>(), vec![8, 8, 4]);

    let header_pages = common::pages_containing(&report, "Control Measures");
    assert_eq!(header_pages.len(), 3, "header on pages {header_pages:?}");
    for pair in header_pages.windows(2) {
        assert_eq!(pair[1], pair[0] + 1);
    }

    let continued = common::pages_containing(&report, "Detailed Risk Assessment (Continued)");
    assert_eq!(continued, header_pages[1..].to_vec());
}

#[test]
fn chunking_disabled_keeps_rows_flowing() {
    let mut opts = common::options();
    opts.rows_per_table_page = 0;
    let report = generate(&common::sample(20), &opts).unwrap();
    let header_pages = common::pages_containing(&report, "Control Measures");
    assert!(!header_pages.is_empty());
    assert!(header_pages.len() < 3);
    assert_within_content_area(&report, &opts.geometry);
}

#[test]
fn rows_that_do_not_fit_break_with_header_repeated() {
    let mut data = common::sample(0);
    let controls = "Isolate, lock off and prove dead before work starts. ".repeat(6);
    data.risks = (0..16)
        .map(|i| RiskEntry::new(&format!("Electrical work {i}"), 3, 4, &controls))
        .collect();

    let mut opts = common::options();
    opts.rows_per_table_page = 0;
    let report = generate(&data, &opts).unwrap();
    assert_within_content_area(&report, &opts.geometry);

    let header_pages = common::pages_containing(&report, "Control Measures");
    assert!(header_pages.len() >= 2, "rows should spill over: {header_pages:?}");
    for page in &header_pages[1..] {
        assert!(report.pages[page - 1].contains("Detailed Risk Assessment (Continued)"));
    }
}

#[test]
fn row_taller_than_a_page_is_split() {
    let mut data = common::sample(0);
    let words: Vec<String> = (0..1500).map(|i| format!("measure{i}")).collect();
    data.risks = vec![RiskEntry::new("Confined space entry", 4, 5, &words.join(" "))];

    let opts = common::options();
    let report = generate(&data, &opts).unwrap();
    assert_within_content_area(&report, &opts.geometry);

    let drawn: usize = report
        .pages
        .iter()
        .flat_map(|p| p.texts.iter())
        .flat_map(|t| t.split_whitespace())
        .filter(|w| {
            w.strip_prefix("measure")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        })
        .count();
    assert_eq!(drawn, 1500);
    assert_eq!(common::pages_containing(&report, "measure1499").len(), 1);
    assert!(common::pages_containing(&report, "Control Measures").len() >= 2);
}

#[test]
fn letter_geometry_is_respected() {
    let mut opts = common::options();
    opts.geometry = PageGeometry::letter();
    let report = generate(&common::sample(30), &opts).unwrap();
    assert_within_content_area(&report, &opts.geometry);
}
