use std::collections::HashMap;

use tristar::{PointId, RTreeCursor, TreeConfig};
use tristar_int_test::test_util::{
    assert_all_reachable, cleanup, create_lattice_context, create_seeded_context,
    create_test_context, run_test,
};

#[test]
fn test_random_inserts_keep_tree_valid() {
    run_test(
        || create_test_context(),
        |ctx| {
            let cursor = ctx.checked_cursor()?;
            assert_eq!(cursor.len(), ctx.records().len());
            assert_all_reachable(cursor.tree())?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_wide_nodes_keep_tree_valid() {
    run_test(
        || create_seeded_context(9, 2000, TreeConfig::new(16, 6, 5)?),
        |ctx| {
            let cursor = ctx.checked_cursor()?;
            assert_eq!(cursor.len(), 2000);
            assert!(cursor.height()? >= 3);
            assert_all_reachable(cursor.tree())?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_smallest_fanout_keeps_tree_valid() {
    run_test(
        || create_seeded_context(3, 300, TreeConfig::new(2, 1, 1)?),
        |ctx| {
            let cursor = ctx.checked_cursor()?;
            assert_eq!(cursor.len(), 300);
            assert_all_reachable(cursor.tree())?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_repeated_coordinates_keep_tree_valid() {
    run_test(
        || create_lattice_context(11, 400),
        |ctx| {
            let cursor = ctx.checked_cursor()?;
            assert_eq!(cursor.len(), 400);
            assert_all_reachable(cursor.tree())?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_height_grows_only_on_root_split() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut cursor = ctx.cursor()?;
            assert_eq!(cursor.height()?, 1);
            for record in ctx.records() {
                let before = cursor.height()?;
                let stats = cursor.insert_record(record.clone())?;
                let after = cursor.height()?;
                if stats.root_split {
                    assert_eq!(after, before + 1, "root split on {}", record.id);
                } else {
                    assert_eq!(after, before, "height changed on {}", record.id);
                }
            }
            assert_eq!(cursor.stats().root_splits as usize, cursor.height()? - 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_cursor_stats_add_up() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut cursor = ctx.cursor()?;
            let mut splits = 0u64;
            let mut reinserted = 0u64;
            for record in ctx.records() {
                let stats = cursor.insert_record(record.clone())?;
                splits += stats.splits as u64;
                reinserted += stats.reinserted.len() as u64;
            }
            let totals = cursor.stats();
            assert_eq!(totals.inserts, ctx.records().len() as u64);
            assert_eq!(totals.splits, splits);
            assert_eq!(totals.reinsertions, reinserted);
            assert!(totals.reinsertions > 0);
            assert!(totals.root_splits <= totals.splits);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bulk_load_matches_sequential_inserts() {
    run_test(
        || create_test_context(),
        |ctx| {
            let bulk = ctx.loaded_cursor()?;
            let mut sequential = ctx.cursor()?;
            for record in ctx.records() {
                sequential.insert_record(record.clone())?;
            }
            assert!(bulk.check_integrity().is_valid);
            assert_eq!(bulk.len(), sequential.len());
            assert_eq!(bulk.height()?, sequential.height()?);
            assert_eq!(
                bulk.tree().to_snapshot()?,
                sequential.tree().to_snapshot()?
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_stored_points_match_input() {
    run_test(
        || create_test_context(),
        |ctx| {
            let cursor = ctx.loaded_cursor()?;
            let expected: HashMap<PointId, _> = ctx
                .records()
                .iter()
                .map(|r| (r.id, (r.coordinates, r.attributes.clone())))
                .collect();

            let stored = cursor.tree().collect_points()?;
            assert_eq!(stored.len(), expected.len());
            for (id, entry) in stored {
                let (coordinates, attributes) = &expected[&id];
                assert_eq!(&entry.coordinates, coordinates);
                assert_eq!(&entry.attributes, attributes);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_leaf_index_agrees_with_locate() {
    run_test(
        || create_test_context(),
        |ctx| {
            let cursor = ctx.loaded_cursor()?;
            let tree = cursor.tree();
            let index = tree.leaf_index()?;
            assert_eq!(index.len(), tree.len());
            for record in ctx.records() {
                let leaf = index[&record.id];
                assert!(tree.node(leaf)?.is_leaf());
                assert_eq!(tree.locate(record.id, &record.coordinates)?, Some(leaf));
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_full_recompute_is_idempotent() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mut cursor = ctx.loaded_cursor()?;
            let before = cursor.tree().to_snapshot()?;
            cursor.update_bounding_rectangles()?;
            assert_eq!(cursor.tree().to_snapshot()?, before);
            cursor.update_bounding_rectangles()?;
            assert_eq!(cursor.tree().to_snapshot()?, before);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_parent_keys_contain_child_keys() {
    run_test(
        || create_test_context(),
        |ctx| {
            let cursor = ctx.loaded_cursor()?;
            let tree = cursor.tree();
            let mut stack = vec![tree.root()];
            while let Some(id) = stack.pop() {
                let node = tree.node(id)?;
                for child in node.children() {
                    assert!(node.key().contains(tree.node(*child)?.key()));
                    stack.push(*child);
                }
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_seeds_are_reproducible() {
    run_test(
        || create_seeded_context(5, 250, TreeConfig::default()),
        |ctx| {
            let first = RTreeCursor::bulk_load(ctx.records().to_vec(), ctx.config())?;
            let second = RTreeCursor::bulk_load(ctx.records().to_vec(), ctx.config())?;
            assert_eq!(first.tree().to_snapshot()?, second.tree().to_snapshot()?);
            assert_eq!(first.stats(), second.stats());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
