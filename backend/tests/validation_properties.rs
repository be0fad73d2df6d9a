//! Validation behaviour observed through `Ingestor::validate_container`.

mod support;

use chrono::Days;
use proptest::prelude::*;

use maskdb_rust::db::MaskRepository;
use maskdb_rust::mdf::sample::{object_id_for_slit, SampleMdf, GUIDE_STAR_ID};
use maskdb_rust::mdf::{CellValue, MemoryContainer};

use support::{sample_ingestor, today};

fn errors_for(container: &MemoryContainer) -> Vec<String> {
    let (_repo, ingestor) = sample_ingestor();
    ingestor.validate_container(container, today()).errors
}

#[test]
fn test_recognized_instruments_pass() {
    assert!(errors_for(&SampleMdf::new().instrument("DEIMOS").build()).is_empty());
    assert!(errors_for(&SampleMdf::new().instrument("LRIS").build()).is_empty());
}

#[test]
fn test_unrecognized_instrument_is_rejected() {
    let errors = errors_for(&SampleMdf::new().instrument("IRCAL").build());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("unrecognized instrument"));
    assert!(errors[0].contains("IRCAL"));
}

#[test]
fn test_slit_count_mismatch_cites_both_numbers() {
    let errors = errors_for(&SampleMdf::new().declared_slits(5).build());
    assert_eq!(
        errors,
        vec!["MaskDesign.DesNslit: slit count mismatch: declared 5 but DesiSlits has 4 rows"]
    );
}

#[test]
fn test_use_date_relative_to_today() {
    let three_days_ago = today().checked_sub_days(Days::new(3)).unwrap();
    let tomorrow = today().checked_add_days(Days::new(1)).unwrap();

    let errors = errors_for(
        &SampleMdf::new()
            .date_use(three_days_ago.format("%Y-%m-%d").to_string())
            .build(),
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("MaskBlu.Date_Use: date in the past"));

    let errors = errors_for(
        &SampleMdf::new()
            .date_use(tomorrow.format("%Y-%m-%d").to_string())
            .build(),
    );
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_repeated_bad_design_reference_reported_once() {
    let mut container = SampleMdf::new().build();
    let slits = container.table_mut("DesiSlits").unwrap();
    slits.set(0, "DesId", 999);
    slits.set(1, "DesId", 999);

    let errors = errors_for(&container);
    assert_eq!(
        errors,
        vec!["DesiSlits row 1: orphan slit: DesId 999 does not match design 42"]
    );
}

#[test]
fn test_guide_star_is_exempt_from_mapping() {
    let errors = errors_for(&SampleMdf::new().build());
    assert!(errors.is_empty(), "{:?}", errors);
    assert!(!errors.iter().any(|e| e.contains(&GUIDE_STAR_ID.to_string())));
}

#[test]
fn test_unmapped_target_is_reported() {
    let mut container = SampleMdf::new().build();
    container.table_mut("SlitObjMap").unwrap().remove_row(2);

    let errors = errors_for(&container);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("ObjectCat row 3: orphan object"));
    assert!(errors[0].contains(&object_id_for_slit(3).to_string()));
}

#[test]
fn test_validation_never_writes() {
    let (repo, ingestor) = sample_ingestor();
    let report = ingestor.validate_container(&SampleMdf::new().build(), today());
    assert!(report.is_empty());
    assert_eq!(repo.table_counts().unwrap().total(), 0);
}

#[test]
fn test_blueprint_for_another_design_is_rejected() {
    let mut container = SampleMdf::new().build();
    container.table_mut("MaskBlu").unwrap().set(0, "DesId", 41i64);

    assert_eq!(
        errors_for(&container),
        vec!["MaskBlu.DesId: blueprint references design 41 but the file describes design 42"]
    );
}

#[test]
fn test_repeated_bad_blueprint_reference_reported_once() {
    let mut container = SampleMdf::new().build();
    let slits = container.table_mut("BluSlits").unwrap();
    slits.set(1, "BluId", 8i64);
    slits.set(3, "BluId", 8i64);

    assert_eq!(
        errors_for(&container),
        vec!["BluSlits row 2: orphan blueprint slit: BluId 8 does not match blueprint 7"]
    );
}

#[test]
fn test_repeated_unknown_design_slit_in_blueprint_reported_once() {
    let mut container = SampleMdf::new().build();
    let slits = container.table_mut("BluSlits").unwrap();
    slits.set(0, "dSlitId", 77i64);
    slits.set(2, "dSlitId", 77i64);

    assert_eq!(
        errors_for(&container),
        vec!["BluSlits row 1: orphan blueprint slit: dSlitId 77 not among DesiSlits"]
    );
}

#[test]
fn test_repeated_bad_mapping_design_reported_once() {
    let mut container = SampleMdf::new().build();
    let map = container.table_mut("SlitObjMap").unwrap();
    map.set(0, "DesId", 43i64);
    map.set(1, "DesId", 43i64);

    assert_eq!(
        errors_for(&container),
        vec!["SlitObjMap row 1: orphan mapping: DesId 43 does not match design 42"]
    );
}

#[test]
fn test_repeated_unknown_mapped_object_reported_once() {
    let mut container = SampleMdf::new().build();
    let map = container.table_mut("SlitObjMap").unwrap();
    for slit in [1i64, 2] {
        map.push_row(vec![
            CellValue::from(42i64),
            CellValue::from(5555i64),
            CellValue::from(slit),
            CellValue::from(4.0),
            CellValue::from(4.0),
        ]);
    }

    assert_eq!(
        errors_for(&container),
        vec!["SlitObjMap row 5: orphan mapping: ObjectId 5555 not among ObjectCat"]
    );
}

#[test]
fn test_repeated_unknown_catalog_reported_once() {
    let mut container = SampleMdf::new().build();
    let objects = container.table_mut("ObjectCat").unwrap();
    objects.set(0, "CatFilePK", 3i64);
    objects.set(1, "CatFilePK", 3i64);

    assert_eq!(
        errors_for(&container),
        vec!["ObjectCat row 1: orphan object: CatFilePK 3 not among CatFiles"]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_revalidation_is_identical(
        slits in 1usize..12,
        declared in 0i64..16,
        instrument in prop::sample::select(vec!["DEIMOS", "LRIS", "IRCAL", "deimos", ""]),
        guide_star in any::<bool>(),
    ) {
        let mut sample = SampleMdf::new()
            .slits(slits)
            .declared_slits(declared)
            .instrument(instrument);
        if !guide_star {
            sample = sample.without_guide_star();
        }
        let container = sample.build();

        let (_repo, ingestor) = sample_ingestor();
        let first = ingestor.validate_container(&container, today());
        let second = ingestor.validate_container(&container, today());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_only_unmapped_targets_are_orphans(slits in 1usize..10, dropped in 0usize..10) {
        let dropped = dropped % slits;
        let mut container = SampleMdf::new().slits(slits).build();
        container.table_mut("SlitObjMap").unwrap().remove_row(dropped);

        let errors = errors_for(&container);
        let orphans: Vec<&String> = errors
            .iter()
            .filter(|e| e.contains("is not mapped to any slit"))
            .collect();
        prop_assert_eq!(orphans.len(), 1);
        prop_assert!(orphans[0].contains(&object_id_for_slit(dropped as i64 + 1).to_string()));
        prop_assert!(!orphans[0].contains(&GUIDE_STAR_ID.to_string()));
    }
}
