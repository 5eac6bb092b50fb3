//! Property tests for the sweep order, round length and sample checks.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use harness::config::{MAX_RATIO_LOG2, SAMPLES_PER_CHANNEL};
use harness::samples::{SampleCursors, TX_DATA};
use harness::{HarnessState, MatrixSequencer};
use platform::{BitDepth, I2sMode, RestartDecision};
use proptest::prelude::*;

/// 16- or 32-bit depth plus a bit position the bus carries.
fn depth_and_carried_bit() -> impl Strategy<Value = (BitDepth, u32)> {
    prop_oneof![Just(16u8), Just(32u8)].prop_flat_map(|bits| {
        (Just(BitDepth::try_new(bits).unwrap()), 0..u32::from(bits))
    })
}

proptest! {
    #[test]
    fn matrix_visits_every_cell_once_in_nested_order(num_mclks in 1usize..=4) {
        let visited: Vec<_> = MatrixSequencer::points(num_mclks)
            .map(|p| (p.mode, p.mclk_index, p.ratio_log2))
            .collect();

        let mut expected = Vec::new();
        for mode in [I2sMode::I2s, I2sMode::LeftJustified] {
            for mclk in 0..num_mclks {
                for ratio in 1..=MAX_RATIO_LOG2 {
                    expected.push((mode, mclk, ratio));
                }
            }
        }
        prop_assert_eq!(visited, expected);
    }

    #[test]
    fn restart_exactly_on_fourth_frame_after_any_reset(prior_frames in 0usize..10) {
        let mut state = HarnessState::new(BitDepth::THIRTY_TWO, 1);
        for _ in 0..prior_frames {
            state.restart_check();
        }
        state.reset_round();

        let decisions: Vec<_> = (0..4).map(|_| state.restart_check()).collect();
        prop_assert_eq!(&decisions[..3], &[RestartDecision::Continue; 3]);
        prop_assert_eq!(decisions[3], RestartDecision::Restart);
    }

    #[test]
    fn transmit_frames_walk_the_table(channels in 1usize..=8, frames in 1usize..=4) {
        let mut cursors = SampleCursors::new();
        let mut frame = vec![0i32; channels];
        for k in 0..frames {
            cursors.produce_transmit_frame(&mut frame);
            for (c, &sample) in frame.iter().enumerate() {
                prop_assert_eq!(sample, TX_DATA[c][k % SAMPLES_PER_CHANNEL]);
            }
        }
    }

    #[test]
    fn difference_on_carried_bit_is_flagged((depth, bit) in depth_and_carried_bit(), channel in 0usize..8) {
        let mut state = HarnessState::new(depth, 1);
        let mut frame: Vec<i32> = (0..8).map(|c| TX_DATA[c][0]).collect();
        frame[channel] ^= 1i32 << bit;
        state.consume_receive_frame(&frame);

        prop_assert!(state.round().error);
        prop_assert_eq!(state.round().mismatches, 1);
        prop_assert_eq!(state.round().first_mismatch.unwrap().channel, channel);
    }

    #[test]
    fn difference_above_16_bits_is_ignored(bit in 16u32..32, channel in 0usize..8) {
        let mut state = HarnessState::new(BitDepth::SIXTEEN, 1);
        let mut frame: Vec<i32> = (0..8).map(|c| TX_DATA[c][0]).collect();
        frame[channel] ^= 1i32 << bit;
        state.consume_receive_frame(&frame);

        prop_assert!(!state.round().error);
    }
}
