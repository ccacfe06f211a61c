//! Partition strategies
//!
//! A [`PartitionStrategy`] names how filtering work is divided; a
//! [`Partition`] is the concrete plan for one image.  Every plan is a grid:
//! a list of column cuts and a list of row cuts, each starting at 0 and
//! ending at the image edge.  The grid cells are the units of work.
//!
//! Splitting the output buffer along the same cuts ([`Partition::split`])
//! hands every unit its own set of mutable row segments, so no two units
//! can ever write the same output sample.

use crate::{FilterError, FilterResult};
use pnmconv_core::Rect;

/// Number of row bands per rayon thread for [`PartitionStrategy::DataParallel`]
const BANDS_PER_THREAD: usize = 4;

/// How the engine divides work across concurrent units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionStrategy {
    /// Single pass over the whole image on the calling thread
    #[default]
    Sequential,
    /// Four rectangles split at `width/2`, `height/2`, one thread each
    QuadrantSplit,
    /// Row bands scheduled on the rayon thread pool
    DataParallel,
    /// Every worker filters the whole image independently.
    ///
    /// Inside the engine this is a sequential pass; the broadcast and
    /// gather around it live in the worker group.
    DistributeReplicate {
        /// Number of workers, coordinator included
        workers: usize,
    },
}

impl PartitionStrategy {
    /// Short name used in logs and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            PartitionStrategy::Sequential => "sequential",
            PartitionStrategy::QuadrantSplit => "quadrant",
            PartitionStrategy::DataParallel => "parallel",
            PartitionStrategy::DistributeReplicate { .. } => "replicate",
        }
    }

    /// Plan the partition of a `width × height` image.
    pub fn plan(&self, width: u32, height: u32) -> Partition {
        match self {
            PartitionStrategy::Sequential | PartitionStrategy::DistributeReplicate { .. } => {
                Partition::whole(width, height)
            }
            PartitionStrategy::QuadrantSplit => Partition::quadrants(width, height),
            PartitionStrategy::DataParallel => {
                let bands = rayon::current_num_threads() * BANDS_PER_THREAD;
                Partition::row_bands(width, height, bands)
            }
        }
    }
}

/// The four quadrants of a `width × height` image
///
/// Order: top-left, top-right, bottom-left, bottom-right.  With odd
/// dimensions the right column and bottom row of quadrants get the extra
/// pixel; with a dimension of 1 the left or top quadrants are empty.
pub fn quadrants(width: u32, height: u32) -> [Rect; 4] {
    let mid_x = width / 2;
    let mid_y = height / 2;
    [
        Rect::from_bounds(0, 0, mid_x, mid_y),
        Rect::from_bounds(mid_x, 0, width, mid_y),
        Rect::from_bounds(0, mid_y, mid_x, height),
        Rect::from_bounds(mid_x, mid_y, width, height),
    ]
}

/// Check that `rects` cover `[0, width) × [0, height)` exactly once.
///
/// Every rect must lie inside the image, no two may share a pixel, and
/// their areas must add up to the image area.  Empty rects are allowed.
pub fn verify_cover(rects: &[Rect], width: u32, height: u32) -> FilterResult<()> {
    for r in rects {
        if !r.fits_within(width, height) {
            return Err(FilterError::InvalidPartition(format!(
                "{:?} extends outside {}x{}",
                r, width, height
            )));
        }
    }
    for (i, a) in rects.iter().enumerate() {
        if let Some(b) = rects[i + 1..].iter().find(|b| a.overlaps(b)) {
            return Err(FilterError::InvalidPartition(format!(
                "{:?} overlaps {:?}",
                a, b
            )));
        }
    }
    let covered: u64 = rects.iter().map(Rect::area).sum();
    let total = width as u64 * height as u64;
    if covered != total {
        return Err(FilterError::InvalidPartition(format!(
            "rects cover {} of {} pixels",
            covered, total
        )));
    }
    Ok(())
}

/// A grid plan: column cuts and row cuts
///
/// Cells are numbered row-major: cell `(i, j)` spans columns
/// `xs[i]..xs[i+1]` and rows `ys[j]..ys[j+1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    xs: Vec<u32>,
    ys: Vec<u32>,
}

impl Partition {
    /// Build a plan from explicit cuts.
    ///
    /// The cuts are checked by [`Partition::verify`], not here.
    pub fn from_cuts(xs: Vec<u32>, ys: Vec<u32>) -> Self {
        Self { xs, ys }
    }

    /// One cell covering the whole image.
    pub fn whole(width: u32, height: u32) -> Self {
        Self::from_cuts(vec![0, width], vec![0, height])
    }

    /// Four cells split at the integer midpoints.
    pub fn quadrants(width: u32, height: u32) -> Self {
        Self::from_cuts(vec![0, width / 2, width], vec![0, height / 2, height])
    }

    /// Full-width bands of near-equal height.
    ///
    /// The band count is clamped to `1..=height`.
    pub fn row_bands(width: u32, height: u32, bands: usize) -> Self {
        let bands = bands.clamp(1, height.max(1) as usize) as u64;
        let ys = (0..=bands)
            .map(|j| (j * height as u64 / bands) as u32)
            .collect();
        Self::from_cuts(vec![0, width], ys)
    }

    /// Column cuts.
    pub fn xs(&self) -> &[u32] {
        &self.xs
    }

    /// Row cuts.
    pub fn ys(&self) -> &[u32] {
        &self.ys
    }

    /// Number of cells, empty ones included.
    pub fn len(&self) -> usize {
        self.xs.len().saturating_sub(1) * self.ys.len().saturating_sub(1)
    }

    /// Whether the plan has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cell rectangles, row-major.
    pub fn rects(&self) -> Vec<Rect> {
        self.ys
            .windows(2)
            .flat_map(|ys| {
                self.xs
                    .windows(2)
                    .map(move |xs| Rect::from_bounds(xs[0], ys[0], xs[1], ys[1]))
            })
            .collect()
    }

    /// Check that the plan covers a `width × height` image exactly once.
    pub fn verify(&self, width: u32, height: u32) -> FilterResult<()> {
        check_cuts("column", &self.xs, width)?;
        check_cuts("row", &self.ys, height)?;
        verify_cover(&self.rects(), width, height)
    }

    /// Carve an output buffer into one [`Region`] per cell.
    ///
    /// `buf` must hold `width * channels` samples per row and the plan must
    /// have passed [`Partition::verify`] for this image; regions are
    /// returned in the same order as [`Partition::rects`].
    pub fn split<'a>(&self, buf: &'a mut [i32], width: u32, channels: usize) -> Vec<Region<'a>> {
        let cols = self.xs.len() - 1;
        let mut regions: Vec<Region<'a>> = self
            .rects()
            .into_iter()
            .map(|rect| Region {
                rect,
                channels,
                rows: Vec::with_capacity(rect.h as usize),
            })
            .collect();

        let row_len = width as usize * channels;
        let mut band = 0;
        for (y, row) in buf.chunks_mut(row_len).enumerate() {
            while y as u32 >= self.ys[band + 1] {
                band += 1;
            }
            let mut rest = row;
            for col in 0..cols {
                let seg = (self.xs[col + 1] - self.xs[col]) as usize * channels;
                let tmp = std::mem::take(&mut rest);
                let (head, tail) = tmp.split_at_mut(seg);
                rest = tail;
                regions[band * cols + col].rows.push(head);
            }
        }
        regions
    }
}

fn check_cuts(axis: &str, cuts: &[u32], extent: u32) -> FilterResult<()> {
    if cuts.len() < 2 || cuts[0] != 0 || cuts[cuts.len() - 1] != extent {
        return Err(FilterError::InvalidPartition(format!(
            "{} cuts {:?} must run from 0 to {}",
            axis, cuts, extent
        )));
    }
    if cuts.windows(2).any(|w| w[0] > w[1]) {
        return Err(FilterError::InvalidPartition(format!(
            "{} cuts {:?} are not sorted",
            axis, cuts
        )));
    }
    Ok(())
}

/// One unit's output window
///
/// Holds a mutable slice per row of `rect`, each exactly
/// `rect.w * channels` samples long.
#[derive(Debug)]
pub struct Region<'a> {
    rect: Rect,
    channels: usize,
    rows: Vec<&'a mut [i32]>,
}

impl<'a> Region<'a> {
    /// The rectangle this window covers.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Mutable row segments, top row first.
    pub fn rows_mut(&mut self) -> &mut [&'a mut [i32]] {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Count how many rects claim each pixel.
    fn coverage(rects: &[Rect], width: u32, height: u32) -> Vec<u32> {
        let mut counts = vec![0u32; (width * height) as usize];
        for r in rects {
            for y in r.y..r.bottom() {
                for x in r.x..r.right() {
                    counts[(y * width + x) as usize] += 1;
                }
            }
        }
        counts
    }

    #[test]
    fn test_quadrants_odd_dimensions() {
        for (w, h) in [(5, 3), (4, 7), (1, 1), (1, 6), (7, 1), (2, 2)] {
            let rects = quadrants(w, h);
            assert!(
                coverage(&rects, w, h).iter().all(|&c| c == 1),
                "{}x{} not covered exactly once: {:?}",
                w,
                h,
                rects
            );
            verify_cover(&rects, w, h).unwrap();
        }
    }

    #[test]
    fn test_quadrants_5x3_layout() {
        let [tl, tr, bl, br] = quadrants(5, 3);
        assert_eq!(tl, Rect::new(0, 0, 2, 1));
        assert_eq!(tr, Rect::new(2, 0, 3, 1));
        assert_eq!(bl, Rect::new(0, 1, 2, 2));
        assert_eq!(br, Rect::new(2, 1, 3, 2));
    }

    #[test]
    fn test_partition_quadrants_match_rects() {
        let p = Partition::quadrants(4, 7);
        assert_eq!(p.rects(), quadrants(4, 7).to_vec());
        p.verify(4, 7).unwrap();
    }

    #[test]
    fn test_verify_cover_rejects_overlap_and_gap() {
        let overlap = [Rect::new(0, 0, 3, 2), Rect::new(2, 0, 2, 2)];
        assert!(matches!(
            verify_cover(&overlap, 4, 2),
            Err(FilterError::InvalidPartition(_))
        ));
        let gap = [Rect::new(0, 0, 2, 2), Rect::new(3, 0, 1, 2)];
        assert!(verify_cover(&gap, 4, 2).is_err());
        let outside = [Rect::new(0, 0, 5, 2)];
        assert!(verify_cover(&outside, 4, 2).is_err());
    }

    #[test]
    fn test_verify_rejects_bad_cuts() {
        assert!(Partition::from_cuts(vec![0, 3, 2, 4], vec![0, 2]).verify(4, 2).is_err());
        assert!(Partition::from_cuts(vec![0, 4], vec![1, 2]).verify(4, 2).is_err());
        assert!(Partition::from_cuts(vec![0, 4], vec![0]).verify(4, 2).is_err());
    }

    #[test]
    fn test_row_bands() {
        let p = Partition::row_bands(6, 10, 3);
        assert_eq!(p.ys(), &[0, 3, 6, 10]);
        p.verify(6, 10).unwrap();
        // more bands than rows collapses to one row each
        let p = Partition::row_bands(6, 2, 16);
        assert_eq!(p.ys(), &[0, 1, 2]);
    }

    #[test]
    fn test_split_writes_are_disjoint() {
        let (w, h, channels) = (5u32, 3u32, 3usize);
        let mut buf = vec![0i32; (w * h) as usize * channels];
        let p = Partition::quadrants(w, h);
        let mut regions = p.split(&mut buf, w, channels);
        assert_eq!(regions.len(), 4);
        for (id, region) in regions.iter_mut().enumerate() {
            let rect = region.rect();
            assert_eq!(region.rows_mut().len(), rect.h as usize);
            for row in region.rows_mut() {
                assert_eq!(row.len(), rect.w as usize * channels);
                for v in row.iter_mut() {
                    *v += id as i32 + 1;
                }
            }
        }
        // Each sample was touched by exactly the unit owning its pixel
        for y in 0..h {
            for x in 0..w {
                let owner = quadrants(w, h)
                    .iter()
                    .position(|r| r.contains(x, y))
                    .unwrap() as i32
                    + 1;
                for c in 0..channels {
                    let idx = ((y * w + x) as usize) * channels + c;
                    assert_eq!(buf[idx], owner, "pixel ({}, {}) channel {}", x, y, c);
                }
            }
        }
    }

    #[test]
    fn test_strategy_plans_verify() {
        for strategy in [
            PartitionStrategy::Sequential,
            PartitionStrategy::QuadrantSplit,
            PartitionStrategy::DataParallel,
            PartitionStrategy::DistributeReplicate { workers: 3 },
        ] {
            for (w, h) in [(1, 1), (5, 3), (4, 7), (33, 2)] {
                strategy.plan(w, h).verify(w, h).unwrap();
            }
        }
    }
}
