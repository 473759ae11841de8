use tristar::{IndexError, PointEntry, PointRecord, RTreeCursor, TreeConfig};
use tristar_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_duplicate_id_in_grown_tree_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut cursor = ctx.loaded_cursor()?;
            let before = cursor.tree().to_snapshot()?;
            let existing = &ctx.records()[123];

            let result = cursor.insert(existing.id, PointEntry::new([1.0, 2.0, 3.0], vec![]));
            assert!(matches!(result, Err(IndexError::DuplicatePoint(id)) if id == existing.id));
            assert_eq!(cursor.len(), ctx.records().len());
            assert_eq!(cursor.tree().to_snapshot()?, before);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_non_finite_point_is_rejected() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut cursor = ctx.loaded_cursor()?;
            let next_id = ctx.records().len() as u64;

            for coordinates in [
                [f64::NAN, 0.0, 0.0],
                [0.0, f64::INFINITY, 0.0],
                [0.0, 0.0, f64::NEG_INFINITY],
            ] {
                let result = cursor.insert(next_id, PointEntry::new(coordinates, vec![]));
                assert!(matches!(result, Err(IndexError::InvalidPoint { id, .. }) if id == next_id));
            }
            assert_eq!(cursor.len(), ctx.records().len());
            assert!(!cursor.tree().contains_point(next_id));
            assert!(cursor.check_integrity().is_valid);

            // the id is still free for a valid point
            cursor.insert(next_id, PointEntry::new([1.0, 1.0, 1.0], vec![]))?;
            assert!(cursor.tree().contains_point(next_id));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_load_with_duplicates_fails() {
    let mut records: Vec<PointRecord> = (0..50u64)
        .map(|i| PointRecord::new(i, [i as f64, 0.0, 0.0], vec![]))
        .collect();
    records.push(PointRecord::new(7, [100.0, 0.0, 0.0], vec![]));

    let result = RTreeCursor::bulk_load(records, TreeConfig::default());
    assert!(matches!(result, Err(IndexError::DuplicatePoint(7))));
}

#[test]
fn test_invalid_configs_are_rejected() {
    assert!(matches!(TreeConfig::new(1, 1, 1), Err(IndexError::InvalidConfig(_))));
    assert!(matches!(TreeConfig::new(8, 5, 1), Err(IndexError::InvalidConfig(_))));
    assert!(matches!(TreeConfig::new(8, 0, 1), Err(IndexError::InvalidConfig(_))));
    assert!(matches!(TreeConfig::new(8, 3, 0), Err(IndexError::InvalidConfig(_))));
    assert!(matches!(TreeConfig::new(8, 3, 7), Err(IndexError::InvalidConfig(_))));
    assert!(TreeConfig::new(8, 3, 6).is_ok());
    assert!(TreeConfig::new(8, 4, 5).is_ok());
}
