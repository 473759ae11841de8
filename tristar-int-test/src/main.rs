use tristar::{IndexResult, RTreeCursor, TreeConfig};
use tristar_int_test::test_util::random_records;
use tristar_kdtree::index_leaves;

fn main() -> IndexResult<()> {
    colog::init();
    println!("Starting stress test...");

    let count = 200_000;
    let config = TreeConfig::new(16, 6, 5)?;
    let records = random_records(7, count, 10_000.0);

    let start = std::time::Instant::now();
    let mut cursor = RTreeCursor::new(config)?;
    for record in records {
        cursor.insert_record(record)?;
    }
    let elapsed = start.elapsed();
    println!(
        "Inserted {} points in {:?} ({:.0} points/sec)",
        count,
        elapsed,
        count as f64 / elapsed.as_secs_f64()
    );

    let stats = cursor.stats();
    println!(
        "height={} splits={} root_splits={} reinsertions={}",
        cursor.height()?,
        stats.splits,
        stats.root_splits,
        stats.reinsertions
    );

    let start = std::time::Instant::now();
    let report = cursor.check_integrity();
    println!(
        "Checked {} nodes in {:?}: valid={}",
        report.nodes_checked,
        start.elapsed(),
        report.is_valid
    );
    for error in report.errors.iter().take(10) {
        println!("  {}", error);
    }

    let start = std::time::Instant::now();
    let mut snapshot = cursor.tree().to_snapshot()?;
    let forest = index_leaves(&mut snapshot);
    let bytes = snapshot.to_bytes()?;
    println!(
        "Snapshot of {} bytes with {} k-d trees built in {:?}",
        bytes.len(),
        forest.len(),
        start.elapsed()
    );

    println!("Stress test completed.");
    Ok(())
}
