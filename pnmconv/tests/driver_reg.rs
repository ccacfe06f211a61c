//! Driver regression test
//!
//! # Test summary
//! - The 3×3 example through files: decode, blur, encode
//! - Every strategy writes the same file
//! - Replicated runs treat the output as a prefix
//! - Errors leave no output behind
//! - A batch run writes one `<prefix>_<name>.<ext>` per preset, each equal
//!   to the single-filter run

use pnmconv::filter::{FilterName, PartitionStrategy, Rounding};
use pnmconv::io::{IoError, read_raster};
use pnmconv::{
    BatchConfig, CoreError, RunConfig, run_filter, run_filter_with, run_filters, run_filters_with,
};
use pnmconv_test::{RegParams, test_data_path};
use std::fs;

#[test]
fn driver_reg() {
    let mut rp = RegParams::new("driver");
    let dir = tempfile::tempdir().expect("create temp dir");

    // --- Test 1: 3x3 example end to end ---
    eprintln!("=== Test 1: 3x3 example ===");
    let input = dir.path().join("example.pgm");
    fs::write(&input, "P2\n3 3\n255\n10 10 10\n10 100 10\n10 10 10\n").expect("write example");
    let output = dir.path().join("example_blur.pgm");
    run_filter(&input, &output, "blur").expect("run_filter");
    let text = fs::read(&output).expect("read output");
    rp.compare_strings(b"P2\n3 3\n255\n33 25 33 25 20 25 33 25 33\n", &text);

    let truncated = dir.path().join("example_blur_trunc.pgm");
    run_filter_with(&RunConfig::new(&input, &truncated, "blur").with_rounding(Rounding::Truncate))
        .expect("truncate run");
    let text = fs::read(&truncated).expect("read truncated");
    rp.compare_strings(b"P2\n3 3\n255\n32 25 32 24 20 24 32 24 32\n", &text);

    // --- Test 2: every shared-memory strategy writes the same bytes ---
    eprintln!("=== Test 2: strategies ===");
    for (file, filter) in [("tile5x3.ppm", "sharpen"), ("ramp8.pgm", "laplace")] {
        let source = test_data_path(file);
        let baseline = dir.path().join(format!("{}_seq_{}", filter, file));
        run_filter(&source, &baseline, filter).expect("sequential run");
        let expected = fs::read(&baseline).expect("read baseline");
        for strategy in [PartitionStrategy::QuadrantSplit, PartitionStrategy::DataParallel] {
            let out = dir.path().join(format!("{}_{}_{}", filter, strategy.name(), file));
            let report = run_filter_with(&RunConfig::new(&source, &out, filter).with_strategy(strategy))
                .expect("strategy run");
            rp.compare_values(1.0, report.outputs.len() as f64, 0.0);
            rp.compare_values(0.0, report.workers.len() as f64, 0.0);
            rp.compare_strings(&expected, &fs::read(&out).expect("read strategy output"));
        }
    }

    // --- Test 3: replicated run writes one file per rank ---
    eprintln!("=== Test 3: replicated ===");
    let source = test_data_path("tile5x3.ppm");
    let baseline = dir.path().join("tile_blur.ppm");
    run_filter(&source, &baseline, "blur").expect("baseline");
    let expected = read_raster(&baseline).expect("read baseline");
    let prefix = dir.path().join("tile");
    let report = run_filter_with(
        &RunConfig::new(&source, &prefix, "blur")
            .with_strategy(PartitionStrategy::DistributeReplicate { workers: 3 }),
    )
    .expect("replicated run");
    rp.compare_values(3.0, report.workers.len() as f64, 0.0);
    for (rank, path) in report.outputs.iter().enumerate() {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        rp.compare_strings(format!("tile_rank{}.ppm", rank).as_bytes(), name.as_bytes());
        rp.compare_raster(&expected, &read_raster(path).expect("read rank output"));
    }

    assert!(rp.cleanup(), "driver regression test failed");
}

#[test]
fn driver_reg_batch() {
    let mut rp = RegParams::new("driver_batch");
    let dir = tempfile::tempdir().expect("create temp dir");

    // --- Every preset, default sequential ---
    eprintln!("=== Batch: all presets ===");
    for file in ["tile5x3.ppm", "ramp8.pgm"] {
        let source = test_data_path(file);
        let ext = if file.ends_with(".ppm") { "ppm" } else { "pgm" };
        let prefix = dir.path().join(format!("all_{}", ext));
        let written = run_filters(&source, &prefix, &[]).expect("batch run");
        rp.compare_values(3.0, written.len() as f64, 0.0);

        for (filter, path) in FilterName::ALL.into_iter().zip(&written) {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            rp.compare_strings(
                format!("all_{}_{}.{}", ext, filter, ext).as_bytes(),
                name.as_bytes(),
            );
            let single = dir.path().join(format!("single_{}.{}", filter, ext));
            run_filter(&source, &single, filter.as_str()).expect("single run");
            rp.compare_strings(
                &fs::read(&single).expect("read single"),
                &fs::read(path).expect("read batch output"),
            );
        }
    }

    // --- A subset under a parallel strategy ---
    eprintln!("=== Batch: subset, quadrants ===");
    let source = test_data_path("tile5x3.ppm");
    let prefix = dir.path().join("subset");
    let reports = run_filters_with(
        &BatchConfig::new(&source, &prefix)
            .with_filters(&[FilterName::Sharpen, FilterName::Blur, FilterName::Sharpen])
            .with_strategy(PartitionStrategy::QuadrantSplit)
            .with_rounding(Rounding::Truncate),
    )
    .expect("subset run");
    rp.compare_values(2.0, reports.len() as f64, 0.0);
    for report in &reports {
        let single = dir.path().join(format!("trunc_{}.ppm", report.filter));
        run_filter_with(
            &RunConfig::new(&source, &single, report.filter.as_str())
                .with_rounding(Rounding::Truncate),
        )
        .expect("single truncated run");
        rp.compare_values(1.0, report.outputs.len() as f64, 0.0);
        rp.compare_strings(
            &fs::read(&single).expect("read single"),
            &fs::read(&report.outputs[0]).expect("read subset output"),
        );
    }
    rp.compare_values(
        0.0,
        if dir.path().join("subset_laplace.ppm").exists() { 1.0 } else { 0.0 },
        0.0,
    );

    // --- Replicated: one group per preset ---
    eprintln!("=== Batch: replicated ===");
    let prefix = dir.path().join("rep");
    let reports = run_filters_with(
        &BatchConfig::new(test_data_path("ramp8.pgm"), &prefix)
            .with_filters(&[FilterName::Laplace, FilterName::Blur])
            .with_strategy(PartitionStrategy::DistributeReplicate { workers: 2 }),
    )
    .expect("replicated batch");
    rp.compare_values(2.0, reports.len() as f64, 0.0);
    for report in &reports {
        rp.compare_values(2.0, report.workers.len() as f64, 0.0);
        for (rank, path) in report.outputs.iter().enumerate() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            rp.compare_strings(
                format!("rep_{}_rank{}.pgm", report.filter, rank).as_bytes(),
                name.as_bytes(),
            );
        }
    }

    // --- Bad input: nothing written ---
    let prefix = dir.path().join("bad");
    let result = run_filters(test_data_path("truncated.pgm"), &prefix, &[]);
    let truncated = matches!(result, Err(CoreError::Io(IoError::Truncated { .. })));
    rp.compare_values(1.0, if truncated { 1.0 } else { 0.0 }, 0.0);
    for filter in FilterName::ALL {
        let path = dir.path().join(format!("bad_{}.pgm", filter));
        rp.compare_values(0.0, if path.exists() { 1.0 } else { 0.0 }, 0.0);
    }

    assert!(rp.cleanup(), "driver batch regression test failed");
}

#[test]
fn driver_reg_errors() {
    let mut rp = RegParams::new("driver_errors");
    let dir = tempfile::tempdir().expect("create temp dir");

    // Binary magic
    let out = dir.path().join("bad.pgm");
    let result = run_filter(test_data_path("binary_magic.pnm"), &out, "blur");
    let bad_magic = matches!(result, Err(CoreError::Io(IoError::BadMagic { .. })));
    rp.compare_values(1.0, if bad_magic { 1.0 } else { 0.0 }, 0.0);
    rp.compare_values(0.0, if out.exists() { 1.0 } else { 0.0 }, 0.0);

    // Truncated sample list
    let out = dir.path().join("short.pgm");
    let result = run_filter(test_data_path("truncated.pgm"), &out, "sharpen");
    let truncated = matches!(result, Err(CoreError::Io(IoError::Truncated { .. })));
    rp.compare_values(1.0, if truncated { 1.0 } else { 0.0 }, 0.0);
    rp.compare_values(0.0, if out.exists() { 1.0 } else { 0.0 }, 0.0);

    // Unknown filter
    let out = dir.path().join("emboss.pgm");
    let result = run_filter(test_data_path("ramp8.pgm"), &out, "emboss");
    let unknown = matches!(result, Err(CoreError::Filter(_)));
    rp.compare_values(1.0, if unknown { 1.0 } else { 0.0 }, 0.0);
    rp.compare_values(0.0, if out.exists() { 1.0 } else { 0.0 }, 0.0);

    // Unknown filter in replicated mode surfaces through the group
    let result = run_filter_with(
        &RunConfig::new(test_data_path("ramp8.pgm"), dir.path().join("r"), "emboss")
            .with_strategy(PartitionStrategy::DistributeReplicate { workers: 2 }),
    );
    let replica = matches!(result, Err(CoreError::Replica(_)));
    rp.compare_values(1.0, if replica { 1.0 } else { 0.0 }, 0.0);

    // Unwritable destination
    let result = run_filter(
        test_data_path("ramp8.pgm"),
        dir.path().join("missing_dir").join("out.pgm"),
        "blur",
    );
    let unwritable = matches!(result, Err(CoreError::Io(IoError::CannotOpen { .. })));
    rp.compare_values(1.0, if unwritable { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "driver error regression test failed");
}
