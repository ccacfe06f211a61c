//! Convolution regression test
//!
//! Applies the three presets to the test rasters and checks the results
//! against hand-computed values.
//!
//! # Test summary
//! - Blur of a single bright pixel spreads it over its 3×3 neighborhood
//! - Blur of the 3×3 example under both rounding rules
//! - Every preset preserves format, dimensions and maximum sample value
//! - Every strategy produces the sequential result on ramp and tile inputs

use pnmconv_core::{Raster, SampleFormat};
use pnmconv_filter::{Engine, FilterName, Kernel, PartitionStrategy, Rounding, convolve};
use pnmconv_test::{RegParams, load_test_image};

const STRATEGIES: [PartitionStrategy; 4] = [
    PartitionStrategy::Sequential,
    PartitionStrategy::QuadrantSplit,
    PartitionStrategy::DataParallel,
    PartitionStrategy::DistributeReplicate { workers: 3 },
];

#[test]
fn convolve_reg() {
    let mut rp = RegParams::new("convolve");

    // --- Test 1: blur spreads a single spike ---
    eprintln!("=== Test 1: blur spike ===");
    let spike = load_test_image("spike.pgm").expect("load spike.pgm");
    let blurred = convolve(&spike, &Kernel::blur(), PartitionStrategy::Sequential)
        .expect("blur spike");
    rp.write_raster(&blurred).expect("write blurred spike");
    for y in 0..5 {
        for x in 0..5 {
            let inner = (1..=3).contains(&x) && (1..=3).contains(&y);
            let expected = if inner { 28.0 } else { 0.0 };
            rp.compare_values(expected, blurred.get(x, y, 0).unwrap_or(-1) as f64, 0.0);
        }
    }

    // --- Test 2: the 3x3 example, both rounding rules ---
    eprintln!("=== Test 2: 3x3 example ===");
    let mut samples = vec![10; 9];
    samples[4] = 100;
    let small = Raster::from_samples(3, 3, SampleFormat::Gray, 255, samples).expect("3x3");
    let nearest = Engine::new(Kernel::blur())
        .apply(&small, PartitionStrategy::Sequential)
        .expect("blur nearest");
    let expected =
        Raster::from_samples(3, 3, SampleFormat::Gray, 255, vec![33, 25, 33, 25, 20, 25, 33, 25, 33])
            .expect("expected nearest");
    rp.compare_raster(&expected, &nearest);
    let truncated = Engine::new(Kernel::blur())
        .with_rounding(Rounding::Truncate)
        .apply(&small, PartitionStrategy::Sequential)
        .expect("blur truncate");
    rp.compare_values(20.0, truncated.get(1, 1, 0).unwrap_or(-1) as f64, 0.0);
    rp.compare_values(32.0, truncated.get(0, 0, 0).unwrap_or(-1) as f64, 0.0);

    // --- Test 3: shape and range are preserved ---
    eprintln!("=== Test 3: shape preserved ===");
    for file in ["ramp8.pgm", "tile5x3.ppm"] {
        let input = load_test_image(file).unwrap_or_else(|e| panic!("load {}: {}", file, e));
        for name in FilterName::ALL {
            let out = convolve(&input, &name.kernel(), PartitionStrategy::Sequential)
                .unwrap_or_else(|e| panic!("{} on {}: {}", name, file, e));
            rp.compare_values(input.width() as f64, out.width() as f64, 0.0);
            rp.compare_values(input.height() as f64, out.height() as f64, 0.0);
            rp.compare_values(input.max_sample() as f64, out.max_sample() as f64, 0.0);
            let in_range = out
                .samples()
                .iter()
                .all(|&s| (0..=out.max_sample()).contains(&s));
            rp.compare_values(1.0, if in_range { 1.0 } else { 0.0 }, 0.0);
            eprintln!("  {} on {}: {}x{}", name, file, out.width(), out.height());
        }
    }

    assert!(rp.cleanup(), "convolve regression test failed");
}

#[test]
fn convolve_reg_strategies() {
    let mut rp = RegParams::new("convolve_strategies");

    for file in ["ramp8.pgm", "tile5x3.ppm", "spike.pgm"] {
        let input = load_test_image(file).unwrap_or_else(|e| panic!("load {}: {}", file, e));
        for name in FilterName::ALL {
            let engine = Engine::new(name.kernel());
            let baseline = engine
                .apply(&input, PartitionStrategy::Sequential)
                .expect("sequential");
            for strategy in STRATEGIES {
                let out = engine.apply(&input, strategy).expect("strategy");
                if !rp.compare_raster(&baseline, &out) {
                    eprintln!("  mismatch: {} {} {}", file, name, strategy.name());
                }
            }
        }
    }

    assert!(rp.cleanup(), "convolve strategy regression test failed");
}
