use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tristar::{IndexResult, PointRecord, RStarTree, RTreeCursor, TreeConfig};

/// Runs a test between a setup and a teardown step.
///
/// The teardown runs even when the test body fails. Panics and errors are
/// reported together with a backtrace, then the test is failed.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> IndexResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> IndexResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> IndexResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", message), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed: {}", error);
}

/// Shared state of one test: a scratch directory, a tree configuration and
/// a reproducible set of records.
#[derive(Clone)]
pub struct TestContext {
    dir: Arc<TempDir>,
    config: TreeConfig,
    records: Arc<Vec<PointRecord>>,
}

impl TestContext {
    pub fn new(dir: TempDir, config: TreeConfig, records: Vec<PointRecord>) -> Self {
        Self {
            dir: Arc::new(dir),
            config,
            records: Arc::new(records),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A file name inside the scratch directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    pub fn records(&self) -> &[PointRecord] {
        &self.records
    }

    /// A fresh cursor over an empty tree.
    pub fn cursor(&self) -> IndexResult<RTreeCursor> {
        RTreeCursor::new(self.config)
    }

    /// A cursor holding all of the context's records.
    pub fn loaded_cursor(&self) -> IndexResult<RTreeCursor> {
        RTreeCursor::bulk_load(self.records.iter().cloned(), self.config)
    }

    /// A cursor holding all of the context's records, each inserted one at a
    /// time with the tree checked after every insertion.
    pub fn checked_cursor(&self) -> IndexResult<RTreeCursor> {
        let mut cursor = self.cursor()?;
        for record in self.records.iter() {
            cursor.insert_record(record.clone())?;
            let report = cursor.check_integrity();
            assert!(
                report.is_valid,
                "tree broken after inserting {}: {:?}",
                record.id, report.errors
            );
        }
        Ok(cursor)
    }
}

/// Points with coordinates in `[0, extent)` on every axis and two
/// attributes in `[0, 1)`.
pub fn random_records(seed: u64, count: usize, extent: f64) -> Vec<PointRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let row = (
                i as u64,
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..extent),
                rng.gen::<f64>(),
                rng.gen::<f64>(),
            );
            PointRecord::from(row)
        })
        .collect()
}

/// Points on a coarse integer lattice, so many share coordinates on some
/// axis.
pub fn lattice_records(seed: u64, count: usize) -> Vec<PointRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let coordinates = [
                rng.gen_range(0..4) as f64,
                rng.gen_range(0..4) as f64,
                rng.gen_range(0..4) as f64,
            ];
            PointRecord::new(i as u64, coordinates, vec![i as f64])
        })
        .collect()
}

pub fn create_test_context() -> IndexResult<TestContext> {
    create_seeded_context(42, 500, TreeConfig::default())
}

pub fn create_seeded_context(
    seed: u64,
    count: usize,
    config: TreeConfig,
) -> IndexResult<TestContext> {
    let dir = tempfile::tempdir()?;
    Ok(TestContext::new(
        dir,
        config,
        random_records(seed, count, 100.0),
    ))
}

pub fn create_lattice_context(seed: u64, count: usize) -> IndexResult<TestContext> {
    let dir = tempfile::tempdir()?;
    Ok(TestContext::new(
        dir,
        TreeConfig::default(),
        lattice_records(seed, count),
    ))
}

/// Asserts that every point is found by descending only through keys that
/// contain it.
pub fn assert_all_reachable(tree: &RStarTree) -> IndexResult<()> {
    for (id, entry) in tree.collect_points()? {
        let leaf = tree.locate(id, &entry.coordinates)?;
        assert!(leaf.is_some(), "point {} is not reachable", id);
    }
    Ok(())
}

/// Removes the files a test wrote. The directory itself goes away with the
/// last clone of the context.
pub fn cleanup(ctx: TestContext) -> IndexResult<()> {
    for entry in std::fs::read_dir(ctx.path())? {
        let path = entry?.path();
        if path.is_file() {
            log::debug!("Removing test file {:?}", path);
            std::fs::remove_file(path)?;
        }
    }
    Ok(())
}
