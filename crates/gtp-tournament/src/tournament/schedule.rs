/// One game to play: indices into the engine list and a batch-wide sequence
/// number used in logs and for picking an opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTask {
    pub black_idx: usize,
    pub white_idx: usize,
    pub sequence: u64,
}

impl GameTask {
    /// Every ordered pair of distinct engines once per iteration, in
    /// iteration-major order. Tasks are produced lazily.
    pub fn matrix(engine_count: usize, iterations: u32) -> impl Iterator<Item = GameTask> {
        (0..iterations)
            .flat_map(move |_| {
                (0..engine_count).flat_map(move |b| {
                    (0..engine_count).filter(move |&w| w != b).map(move |w| (b, w))
                })
            })
            .zip(0u64..)
            .map(|((black_idx, white_idx), sequence)| GameTask {
                black_idx,
                white_idx,
                sequence,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn covers_every_ordered_pair_each_iteration() {
        let tasks: Vec<GameTask> = GameTask::matrix(4, 3).collect();
        assert_eq!(tasks.len(), 3 * 4 * 3);

        let mut counts: HashMap<(usize, usize), u32> = HashMap::new();
        for t in &tasks {
            assert_ne!(t.black_idx, t.white_idx);
            *counts.entry((t.black_idx, t.white_idx)).or_default() += 1;
        }
        assert_eq!(counts.len(), 12);
        assert!(counts.values().all(|&c| c == 3));
    }

    #[test]
    fn sequence_numbers_are_consecutive() {
        let seqs: Vec<u64> = GameTask::matrix(3, 2).map(|t| t.sequence).collect();
        assert_eq!(seqs, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn order_within_iteration() {
        let first: Vec<(usize, usize)> =
            GameTask::matrix(3, 1).map(|t| (t.black_idx, t.white_idx)).collect();
        assert_eq!(first, vec![(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)]);
    }

    #[test]
    fn degenerate_inputs_yield_nothing() {
        assert_eq!(GameTask::matrix(1, 5).count(), 0);
        assert_eq!(GameTask::matrix(3, 0).count(), 0);
    }
}
