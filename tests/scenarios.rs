use bmi_tracker::{
    calculate, show_history, trend, BmiError, CalculationForm, Category, Field, History,
    RecordStore,
};

fn store() -> (tempfile::TempDir, RecordStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("bmi_data.db")).unwrap();
    (dir, store)
}

fn calc(store: &RecordStore, user: &str, weight: &str, height: &str) -> Result<(f64, Category), BmiError> {
    calculate(store, &CalculationForm::new(user, weight, height))
        .map(|c| (c.record.bmi, c.record.category))
}

#[test]
fn scenario_a_normal() {
    let (_dir, store) = store();
    assert_eq!(calc(&store, "ann", "70", "175").unwrap(), (22.86, Category::Normal));
}

#[test]
fn scenario_b_underweight() {
    let (_dir, store) = store();
    assert_eq!(calc(&store, "ann", "50", "180").unwrap(), (15.43, Category::Underweight));
}

#[test]
fn scenario_c_obese() {
    let (_dir, store) = store();
    assert_eq!(calc(&store, "ann", "95", "170").unwrap(), (32.87, Category::Obese));
}

#[test]
fn scenario_d_empty_username() {
    let (_dir, store) = store();
    let err = calc(&store, "", "70", "175").unwrap_err();
    assert!(matches!(err, BmiError::InvalidInput { field: Field::Username, .. }));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn scenario_e_weight_out_of_range() {
    let (_dir, store) = store();
    let err = calc(&store, "ann", "310", "175").unwrap_err();
    assert!(matches!(err, BmiError::OutOfPlausibleRange { field: Field::Weight, .. }));
    assert!(store.query_by_user("ann").unwrap().is_empty());
}

#[test]
fn scenario_f_single_record_history() {
    let (_dir, store) = store();
    calc(&store, "ann", "70", "175").unwrap();

    let history = show_history(&store, "ann").unwrap();
    assert_eq!(history.rows().len(), 1);
    assert!(!history.has_trend());
    assert!(trend(&store, "ann").unwrap().is_empty());
}

#[test]
fn appended_records_come_back_in_order() {
    let (_dir, store) = store();
    calc(&store, "ann", "70", "175").unwrap();
    calc(&store, "bob", "80", "180").unwrap();
    calc(&store, "ann", "72", "175").unwrap();
    calc(&store, "ann", "74", "175").unwrap();

    let records = store.query_by_user("ann").unwrap();
    let weights: Vec<f64> = records.iter().map(|r| r.weight).collect();
    assert_eq!(weights, vec![70.0, 72.0, 74.0]);
    assert!(records.windows(2).all(|w| w[0].id < w[1].id));

    let history = History::load(&store, "ann").unwrap();
    assert_eq!(history.trend().len(), 3);
}

#[test]
fn reopening_store_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bmi_data.db");

    let first = RecordStore::open(&path).unwrap();
    calc(&first, "ann", "70", "175").unwrap();

    let second = RecordStore::open(&path).unwrap();
    assert_eq!(second.count().unwrap(), 1);
    assert_eq!(second.query_by_user("ann").unwrap()[0].bmi, 22.86);
}
