//! Property tests for the shared feature path.

use proptest::prelude::*;
use std::collections::HashMap;
use txn_risk::config::{ServingConfig, SplitConfig};
use txn_risk::features::{
    build_one, derive_record, synthetic_record, FeatureSchema, OfflineFeatureBuilder, RawDataset,
    RawRecord, StandardScaler, FEATURE_ORDER, TYPE_CATEGORIES, TYPE_PREFIX,
};

fn numeric_cols() -> Vec<String> {
    FEATURE_ORDER
        .iter()
        .filter(|c| !c.starts_with(TYPE_PREFIX))
        .map(|c| c.to_string())
        .collect()
}

fn artifacts() -> (StandardScaler, FeatureSchema) {
    let names = numeric_cols();
    let n = names.len();
    let mean = (0..n).map(|i| i as f64 * 10.0).collect();
    let scale = (0..n).map(|i| 1.0 + i as f64).collect();
    let scaler = StandardScaler::from_parts(names.clone(), mean, scale).unwrap();
    let schema = FeatureSchema::builtin(names).unwrap();
    (scaler, schema)
}

fn tx_type() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(TYPE_CATEGORIES.to_vec()).prop_map(str::to_string),
        "[a-z_]{1,12}",
        proptest::sample::select(vec!["transfer", " Cash_Out ", "payment"]).prop_map(str::to_string),
    ]
}

/// Raw history over a subset of categories, optionally with one extra raw numeric column.
fn raw_history(
    categories: &[&str],
    extra: bool,
    rows: &[(usize, f64, f64)],
) -> RawDataset {
    let mut csv = String::from(
        "step,type,amount,nameOrig,oldbalanceOrg,newbalanceOrig,nameDest,oldbalanceDest,newbalanceDest,isFraud,isFlaggedFraud",
    );
    if extra {
        csv.push_str(",velocity");
    }
    csv.push('\n');
    for (i, (cat, amount, velocity)) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{amount},C{i},{},{},M{i},{},{},{},0",
            i % 5 + 1,
            categories[cat % categories.len()],
            amount * 1.5,
            amount * 0.5,
            i as f64 * 0.1,
            i as f64 * 0.1 + amount,
            u8::from(i % 3 == 0),
        ));
        if extra {
            csv.push_str(&format!(",{velocity}"));
        }
        csv.push('\n');
    }
    RawDataset::from_reader(csv.as_bytes()).unwrap()
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn offline_schemas_align_and_match_online_rows(
        categories in proptest::sample::subsequence(TYPE_CATEGORIES.to_vec(), 1..=5),
        extra in any::<bool>(),
        rows in proptest::collection::vec((0usize..5, 0.0f64..1e6, -50.0f64..50.0), 10..40),
    ) {
        let dataset = raw_history(&categories, extra, &rows);
        let out = OfflineFeatureBuilder::new(SplitConfig::default()).build(&dataset).unwrap();
        let schema = &out.schema;

        let present: std::collections::BTreeSet<&str> =
            rows.iter().map(|(c, _, _)| categories[c % categories.len()]).collect();
        let one_hot: Vec<String> = present.iter().map(|c| format!("{TYPE_PREFIX}{c}")).collect();
        prop_assert_eq!(&schema.all_columns()[schema.width() - one_hot.len()..], one_hot.as_slice());
        prop_assert_eq!(schema.all_columns().iter().any(|c| c == "velocity"), extra);

        // The scaler the partitions were built with survives its own persisted form.
        let reloaded: StandardScaler =
            serde_json::from_str(&serde_json::to_string_pretty(&out.scaler).unwrap()).unwrap();
        prop_assert_eq!(&reloaded, &out.scaler);

        let mut online: HashMap<Vec<u64>, usize> = HashMap::new();
        for record in dataset.records() {
            let row = build_one(record, &reloaded, schema).unwrap();
            prop_assert_eq!(row.columns(), schema.all_columns());
            let hot = row
                .columns()
                .iter()
                .zip(row.values())
                .filter(|(c, v)| c.starts_with(TYPE_PREFIX) && **v == 1.0)
                .count();
            prop_assert_eq!(hot, 1);
            *online.entry(bits(row.values())).or_default() += 1;
        }
        for part in [&out.train, &out.validation, &out.test] {
            for row in &part.rows {
                prop_assert_eq!(row.len(), schema.width());
                let left = online.get_mut(&bits(row)).unwrap();
                prop_assert!(*left > 0, "{} row reproduced more often than built", part.name);
                *left -= 1;
            }
        }
        prop_assert!(online.values().all(|n| *n == 0));
    }
}

proptest! {
    #[test]
    fn output_columns_follow_schema_order(t in tx_type(), amount in 0.0f64..1e9) {
        let (scaler, schema) = artifacts();
        let record = synthetic_record(&t, amount, &ServingConfig::default()).unwrap();
        let row = build_one(&record, &scaler, &schema).unwrap();
        prop_assert_eq!(row.columns(), schema.all_columns());
        prop_assert_eq!(row.values().len(), FEATURE_ORDER.len());
    }

    #[test]
    fn build_one_is_deterministic(t in tx_type(), amount in 0.0f64..1e9) {
        let (scaler, schema) = artifacts();
        let record = synthetic_record(&t, amount, &ServingConfig::default()).unwrap();
        let a = build_one(&record, &scaler, &schema).unwrap();
        let b = build_one(&record, &scaler, &schema).unwrap();
        prop_assert_eq!(a.values(), b.values());
    }

    #[test]
    fn at_most_one_category_column_set(t in tx_type(), amount in 0.0f64..1e6) {
        let (scaler, schema) = artifacts();
        let record = synthetic_record(&t, amount, &ServingConfig::default()).unwrap();
        let row = build_one(&record, &scaler, &schema).unwrap();
        let hot: Vec<f64> = row
            .columns()
            .iter()
            .zip(row.values())
            .filter(|(c, _)| c.starts_with(TYPE_PREFIX))
            .map(|(_, v)| *v)
            .collect();
        prop_assert!(hot.iter().all(|v| *v == 0.0 || *v == 1.0));
        prop_assert!(hot.iter().sum::<f64>() <= 1.0);
    }

    #[test]
    fn amount_log_is_monotonic(a in 0.0f64..1e12, b in 0.0f64..1e12) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let categories: Vec<String> = TYPE_CATEGORIES.iter().map(|c| c.to_string()).collect();
        let derive = |amount: f64| {
            let record = RawRecord::new().with("amount", amount).with("type", "PAYMENT");
            derive_record(&record, &[], &categories).unwrap().get("amount_log").unwrap()
        };
        prop_assert!(derive(lo) <= derive(hi));
    }

    #[test]
    fn scaler_round_trips(row in proptest::collection::vec(-1e6f64..1e6, 10)) {
        let (scaler, _) = artifacts();
        let scaled = scaler.transform_row(&row).unwrap();
        let back = scaler.inverse_transform_row(&scaled).unwrap();
        for (x, y) in row.iter().zip(&back) {
            prop_assert!((x - y).abs() <= 1e-6 * x.abs().max(1.0));
        }
    }
}
