use migrator::steps::safe_add_column_with_default;

/// Pure structural check — no database required. Verifies the
/// canonical sequence is assembled in the right order with the right
/// transactionality flags: add (tx) -> backfill (non-tx) -> not null
/// (tx) -> default (tx).
#[test]
fn assembles_four_steps_in_canonical_order() {
    let steps = safe_add_column_with_default("customers", "loyalty_tier", "text", "'bronze'");

    assert_eq!(steps.len(), 4);
    let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec!["add_nullable_column", "backfill_column", "attach_not_null", "attach_default"]
    );

    let non_transactional: Vec<bool> = steps.iter().map(|s| s.non_transactional()).collect();
    assert_eq!(non_transactional, vec![false, true, false, false]);
}
