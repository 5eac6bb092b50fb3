//! Parameter-matrix sequencer.
//!
//! Walks every (ratio, MCLK, mode) combination exactly once, in nested order:
//!
//! ```text
//! for mode in [I2s, LeftJustified]          // outermost
//!     for mclk_index in 0..num_mclks
//!         for ratio_log2 in 1..=MAX_RATIO_LOG2   // innermost
//! ```
//!
//! The sequencer is a pure cursor: it never touches hardware and it never
//! terminates the process. Running off the end of the matrix is reported as
//! [`Step::Exhausted`] and the caller decides what that means.

use platform::{I2sMode, MclkBclkRatio};

use crate::config::{MAX_RATIO_LOG2, NUM_MODES};

/// One cell of the parameter matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatrixPoint {
    /// MCLK/BCLK exponent, `1..=MAX_RATIO_LOG2`.
    pub ratio_log2: u8,
    /// Index into the MCLK table.
    pub mclk_index: usize,
    /// Justification mode.
    pub mode: I2sMode,
}

impl MatrixPoint {
    /// The first cell visited.
    pub const FIRST: Self = Self {
        ratio_log2: 1,
        mclk_index: 0,
        mode: I2sMode::I2s,
    };

    /// MCLK/BCLK ratio for this cell.
    pub fn ratio(&self) -> MclkBclkRatio {
        // Invariant: 1 <= ratio_log2 <= MAX_RATIO_LOG2 < MclkBclkRatio::MAX_LOG2.
        MclkBclkRatio::from_log2(self.ratio_log2).unwrap_or(MclkBclkRatio::MIN)
    }
}

/// Result of [`MatrixSequencer::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Run this cell next.
    Next(MatrixPoint),
    /// Every cell has been visited.
    Exhausted,
}

/// Cursor over the parameter matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixSequencer {
    point: MatrixPoint,
    num_mclks: usize,
    started: bool,
    exhausted: bool,
}

impl MatrixSequencer {
    /// Create a sequencer over `num_mclks` master-clock frequencies.
    pub fn new(num_mclks: usize) -> Self {
        Self {
            point: MatrixPoint::FIRST,
            num_mclks: num_mclks.max(1),
            started: false,
            exhausted: false,
        }
    }

    /// Cell most recently handed out (the first cell before any advance).
    pub fn current(&self) -> MatrixPoint {
        self.point
    }

    /// Whether `advance` has been called at least once.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Whether the matrix has been exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of cells in the matrix.
    pub fn len(&self) -> usize {
        usize::from(MAX_RATIO_LOG2)
            .saturating_mul(self.num_mclks)
            .saturating_mul(NUM_MODES)
    }

    /// Always `false`; a matrix has at least one MCLK and one ratio.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Move to the next cell.
    ///
    /// The first call only hands out [`MatrixPoint::FIRST`]. Once exhausted,
    /// the cursor stays on the final cell and every further call returns
    /// [`Step::Exhausted`].
    pub fn advance(&mut self) -> Step {
        if !self.started {
            self.started = true;
            return Step::Next(self.point);
        }
        if self.exhausted {
            return Step::Exhausted;
        }

        let mut next = self.point;
        if next.ratio_log2 < MAX_RATIO_LOG2 {
            next.ratio_log2 = next.ratio_log2.saturating_add(1);
        } else {
            next.ratio_log2 = 1;
            if next.mclk_index.saturating_add(1) < self.num_mclks {
                next.mclk_index = next.mclk_index.saturating_add(1);
            } else {
                next.mclk_index = 0;
                match next.mode {
                    I2sMode::I2s => next.mode = I2sMode::LeftJustified,
                    I2sMode::LeftJustified => {
                        self.exhausted = true;
                        return Step::Exhausted;
                    }
                }
            }
        }

        self.point = next;
        Step::Next(next)
    }

    /// Every cell in visiting order.
    pub fn points(num_mclks: usize) -> impl Iterator<Item = MatrixPoint> {
        let mut seq = Self::new(num_mclks);
        core::iter::from_fn(move || match seq.advance() {
            Step::Next(p) => Some(p),
            Step::Exhausted => None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn first_advance_only_initialises() {
        let mut seq = MatrixSequencer::new(1);
        assert!(!seq.started());
        assert_eq!(seq.advance(), Step::Next(MatrixPoint::FIRST));
        assert!(seq.started());
        assert_eq!(seq.current(), MatrixPoint::FIRST);
    }

    #[test]
    fn ratio_is_innermost() {
        let points: Vec<_> = MatrixSequencer::points(2).take(4).collect();
        assert_eq!(
            points.iter().map(|p| (p.ratio_log2, p.mclk_index)).collect::<Vec<_>>(),
            vec![(1, 0), (2, 0), (3, 0), (1, 1)]
        );
    }

    #[test]
    fn smoke_matrix_order() {
        use I2sMode::{I2s, LeftJustified};
        let got: Vec<_> = MatrixSequencer::points(1)
            .map(|p| (p.ratio_log2, p.mclk_index, p.mode))
            .collect();
        assert_eq!(
            got,
            vec![
                (1, 0, I2s),
                (2, 0, I2s),
                (3, 0, I2s),
                (1, 0, LeftJustified),
                (2, 0, LeftJustified),
                (3, 0, LeftJustified),
            ]
        );
    }

    #[test]
    fn exhaustion_is_sticky_and_keeps_final_cell() {
        let mut seq = MatrixSequencer::new(1);
        for _ in 0..6 {
            assert!(matches!(seq.advance(), Step::Next(_)));
        }
        assert_eq!(seq.advance(), Step::Exhausted);
        assert_eq!(seq.advance(), Step::Exhausted);
        assert!(seq.is_exhausted());
        assert_eq!(
            seq.current(),
            MatrixPoint {
                ratio_log2: MAX_RATIO_LOG2,
                mclk_index: 0,
                mode: I2sMode::LeftJustified
            }
        );
    }

    #[test]
    fn len_matches_visited_cells() {
        for n in 1..=3 {
            assert_eq!(MatrixSequencer::points(n).count(), MatrixSequencer::new(n).len());
        }
    }

    #[test]
    fn point_ratio_follows_exponent() {
        let p = MatrixPoint {
            ratio_log2: 3,
            ..MatrixPoint::FIRST
        };
        assert_eq!(p.ratio().get(), 8);
        assert_eq!(p.ratio().divider(), 4);
    }
}
