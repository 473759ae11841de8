use tristar::{IndexError, NodeRecord, PointRecord, RStarTree, RTreeCursor, TreeConfig};
use tristar_int_test::test_util::{
    assert_all_reachable, cleanup, create_lattice_context, create_test_context,
    random_records, run_test,
};

#[test]
fn test_json_file_round_trip() {
    run_test(
        || create_lattice_context(21, 300),
        |ctx| {
            let cursor = ctx.loaded_cursor()?;
            let snapshot = cursor.tree().to_snapshot()?;
            let path = ctx.file("tree.json");
            snapshot.save_json(&path)?;

            let loaded = NodeRecord::load_json(&path)?;
            assert_eq!(loaded, snapshot);
            assert_eq!(loaded.point_count(), 300);

            let restored = RStarTree::from_snapshot(&loaded)?;
            assert_eq!(restored.len(), 300);
            assert_eq!(restored.height()?, cursor.height()?);
            assert_eq!(restored.to_snapshot()?, snapshot);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_binary_round_trip() {
    run_test(
        || create_test_context(),
        |ctx| {
            let cursor = ctx.loaded_cursor()?;
            let snapshot = cursor.tree().to_snapshot()?;
            let bytes = snapshot.to_bytes()?;
            let decoded = NodeRecord::from_bytes(&bytes)?;
            assert_eq!(decoded, snapshot);

            let restored = RStarTree::from_snapshot(&decoded)?;
            let restored = RTreeCursor::with_tree(restored, ctx.config())?;
            let report = restored.check_integrity();
            assert!(report.is_valid, "{:?}", report.errors);
            assert_all_reachable(restored.tree())?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_restored_tree_accepts_inserts() {
    run_test(
        || create_test_context(),
        |ctx| {
            let cursor = ctx.loaded_cursor()?;
            let bytes = cursor.tree().to_snapshot()?.to_bytes()?;
            let tree = RStarTree::from_snapshot(&NodeRecord::from_bytes(&bytes)?)?;
            let mut restored = RTreeCursor::with_tree(tree, ctx.config())?;

            let offset = ctx.records().len() as u64;
            for record in random_records(77, 200, 100.0) {
                let record = PointRecord::new(record.id + offset, record.coordinates, record.attributes);
                restored.insert_record(record)?;
            }
            assert_eq!(restored.len(), ctx.records().len() + 200);
            let report = restored.check_integrity();
            assert!(report.is_valid, "{:?}", report.errors);
            assert_all_reachable(restored.tree())?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_pretty_json_matches_compact() {
    run_test(
        || create_lattice_context(4, 60),
        |ctx| {
            let snapshot = ctx.loaded_cursor()?.tree().to_snapshot()?;
            let pretty = NodeRecord::from_json(&snapshot.to_pretty_json()?)?;
            let compact = NodeRecord::from_json(&snapshot.to_json()?)?;
            assert_eq!(pretty, compact);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_snapshot_layout() {
    run_test(
        || create_test_context(),
        |ctx| {
            let snapshot = ctx.loaded_cursor()?.tree().to_snapshot()?;
            assert!(!snapshot.is_leaf);
            assert!(!snapshot.is_null);

            let mut leaves = 0;
            snapshot.walk(&mut |record| {
                assert!(record.key.is_some());
                assert!(record.kdtree.is_none());
                if record.is_leaf {
                    leaves += 1;
                    assert!(record.children.is_empty());
                    assert!(record.points.as_ref().is_some_and(|p| !p.is_empty()));
                } else {
                    assert!(record.points.is_none());
                    assert!(!record.children.is_empty());
                }
            });
            assert!(leaves > 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_tree_snapshot() {
    run_test(
        || create_test_context(),
        |ctx| {
            let cursor = ctx.cursor()?;
            let snapshot = cursor.tree().to_snapshot()?;
            assert_eq!(snapshot, NodeRecord::null());

            let path = ctx.file("empty.json");
            snapshot.save_json(&path)?;
            let restored = RStarTree::from_snapshot(&NodeRecord::load_json(&path)?)?;
            assert!(restored.is_empty());
            assert_eq!(restored.height()?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bad_input_is_reported() {
    run_test(
        || create_test_context(),
        |ctx| {
            assert!(matches!(
                NodeRecord::from_json("{not json"),
                Err(IndexError::Serialization(_))
            ));
            assert!(matches!(
                NodeRecord::load_json(ctx.file("missing.json")),
                Err(IndexError::Io(_))
            ));
            assert!(NodeRecord::from_bytes(&[0xff, 0x01]).is_err());

            let mut snapshot = ctx.loaded_cursor()?.tree().to_snapshot()?;
            let mut node = &mut snapshot;
            while !node.is_leaf {
                node = &mut node.children[0];
            }
            node.children.push(NodeRecord::default());
            assert!(matches!(
                RStarTree::from_snapshot(&snapshot),
                Err(IndexError::IllegalNode(_))
            ));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_snapshot_binds_only_to_a_fitting_config() {
    let records: Vec<PointRecord> = (0..7u64)
        .map(|i| PointRecord::new(i, [i as f64, (i % 3) as f64, (i % 2) as f64], vec![]))
        .collect();
    let wide_config = TreeConfig::new(8, 3, 2).unwrap();
    let cursor = RTreeCursor::bulk_load(records, wide_config).unwrap();
    assert_eq!(cursor.height().unwrap(), 1);
    let snapshot = cursor.tree().to_snapshot().unwrap();

    // seven points in one leaf overflow M = 4
    let tree = RStarTree::from_snapshot(&snapshot).unwrap();
    match RTreeCursor::with_tree(tree, TreeConfig::default()) {
        Err(IndexError::InvalidConfig(msg)) => assert!(msg.contains("more than 4"), "{}", msg),
        other => panic!("expected InvalidConfig, got {:?}", other.map(|c| c.len())),
    }

    let tree = RStarTree::from_snapshot(&snapshot).unwrap();
    let mut restored = RTreeCursor::with_tree(tree, wide_config).unwrap();
    restored
        .insert_record(PointRecord::new(7, [7.0, 1.0, 1.0], vec![]))
        .unwrap();
    assert_eq!(restored.len(), 8);
    assert!(restored.check_integrity().is_valid);
}

#[test]
fn test_small_config_snapshot_rejected_by_wider_config() {
    let records = random_records(8, 120, 10.0);
    let cursor = RTreeCursor::bulk_load(records, TreeConfig::default()).unwrap();
    let tree = RStarTree::from_snapshot(&cursor.tree().to_snapshot().unwrap()).unwrap();

    // a tree built with M = 4 violates the minimum fill of M = 16, m = 6
    let result = RTreeCursor::with_tree(tree, TreeConfig::new(16, 6, 5).unwrap());
    assert!(matches!(
        result,
        Err(IndexError::InvalidConfig(msg)) if msg.contains("fewer than 6")
    ));
}
