use tristar::{Coordinates, NodeRecord, RStarTree};
use tristar_int_test::test_util::{cleanup, create_lattice_context, create_test_context, run_test};
use tristar_kdtree::{index_leaves, index_leaves_with, AxisPolicy, KdForest, KdRecord};

fn sorted(mut points: Vec<Coordinates>) -> Vec<Coordinates> {
    points.sort_by(|a, b| {
        a[0].total_cmp(&b[0])
            .then(a[1].total_cmp(&b[1]))
            .then(a[2].total_cmp(&b[2]))
    });
    points
}

/// Every point left of a node is at most the node's coordinate on its axis,
/// every point right of it at least that.
fn assert_median_order(node: &KdRecord) {
    let split = node.point[node.axis];
    if let Some(left) = &node.left {
        assert!(left.points().iter().all(|p| p[node.axis] <= split));
        assert_median_order(left);
    }
    if let Some(right) = &node.right {
        assert!(right.points().iter().all(|p| p[node.axis] >= split));
        assert_median_order(right);
    }
}

fn assert_cyclic_axes(node: &KdRecord, depth: usize) {
    assert_eq!(node.axis, depth % 3);
    if let Some(left) = &node.left {
        assert_cyclic_axes(left, depth + 1);
    }
    if let Some(right) = &node.right {
        assert_cyclic_axes(right, depth + 1);
    }
}

/// Left subtrees hold `n / 2` points and right subtrees the rest but one.
fn assert_balanced(node: &KdRecord) {
    let n = node.len();
    let left = node.left.as_ref().map_or(0, |l| l.len());
    let right = node.right.as_ref().map_or(0, |r| r.len());
    assert_eq!(left, n / 2);
    assert_eq!(right, n - n / 2 - 1);
    if let Some(l) = &node.left {
        assert_balanced(l);
    }
    if let Some(r) = &node.right {
        assert_balanced(r);
    }
}

#[test]
fn test_every_leaf_gets_its_own_tree() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut snapshot = ctx.loaded_cursor()?.tree().to_snapshot()?;
            let forest = index_leaves(&mut snapshot);

            let mut leaves = 0;
            snapshot.walk(&mut |record| {
                if !record.is_leaf {
                    assert!(record.kdtree.is_none());
                    return;
                }
                leaves += 1;
                let id = record.kdtree.as_deref().unwrap();
                assert_eq!(id, format!("kdtree_{}", leaves));

                let tree = forest.get(id).unwrap();
                let leaf_points: Vec<Coordinates> = record
                    .points
                    .as_ref()
                    .unwrap()
                    .values()
                    .map(|(c, _)| *c)
                    .collect();
                assert_eq!(sorted(tree.points()), sorted(leaf_points));
                assert_median_order(tree);
                assert_balanced(tree);
            });
            assert_eq!(forest.len(), leaves);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_cyclic_policy_on_real_leaves() {
    run_test(
        || create_lattice_context(2, 200),
        |ctx| {
            let mut snapshot = ctx.loaded_cursor()?.tree().to_snapshot()?;
            let forest = index_leaves_with(&mut snapshot, AxisPolicy::Cyclic);
            assert!(!forest.is_empty());
            for (_, tree) in forest.iter() {
                assert_cyclic_axes(tree, 0);
                assert_median_order(tree);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_forest_and_indexed_snapshot_files() {
    run_test(
        || create_lattice_context(13, 250),
        |ctx| {
            let mut snapshot = ctx.loaded_cursor()?.tree().to_snapshot()?;
            let forest = index_leaves(&mut snapshot);

            let forest_path = ctx.file("kdtree_tree.json");
            let snapshot_path = ctx.file("tree.json");
            forest.save_json(&forest_path)?;
            snapshot.save_json(&snapshot_path)?;

            let loaded_forest = KdForest::load_json(&forest_path)?;
            let loaded_snapshot = NodeRecord::load_json(&snapshot_path)?;
            assert_eq!(loaded_forest, forest);
            assert_eq!(loaded_snapshot, snapshot);

            // every id in the snapshot resolves in the forest
            loaded_snapshot.walk(&mut |record| {
                if let Some(id) = &record.kdtree {
                    assert!(loaded_forest.get(id).is_some(), "dangling {}", id);
                }
            });

            // restoring the tree drops the secondary index ids
            let restored = RStarTree::from_snapshot(&loaded_snapshot)?.to_snapshot()?;
            restored.walk(&mut |record| assert!(record.kdtree.is_none()));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_reindexing_after_growth() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut cursor = ctx.cursor()?;
            let (first, second) = ctx.records().split_at(100);
            for record in first {
                cursor.insert_record(record.clone())?;
            }
            let mut snapshot = cursor.tree().to_snapshot()?;
            let small = index_leaves(&mut snapshot);

            for record in second {
                cursor.insert_record(record.clone())?;
            }
            let mut grown = cursor.tree().to_snapshot()?;
            let large = index_leaves(&mut grown);
            assert!(large.len() > small.len());

            let indexed: usize = large.iter().map(|(_, tree)| tree.len()).sum();
            assert_eq!(indexed, ctx.records().len());

            // indexing the same snapshot twice gives the same forest
            assert_eq!(index_leaves(&mut grown), large);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
