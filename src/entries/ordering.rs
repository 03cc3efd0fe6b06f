// Ordering rules for one (list, category) partition - pure, no side effects

/// How a move rearranges a partition of `len` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// Source and target coincide; nothing changes.
    Stay,
    /// Entries in `(from, to]` slide one slot down, the moved entry lands on `to`.
    Forward { from: i64, to: i64 },
    /// Entries in `[to, from)` slide one slot up, the moved entry lands on `to`.
    Backward { from: i64, to: i64 },
}

impl MovePlan {
    /// Plan moving the entry at `from` to `to`. Returns `None` when either
    /// index lies outside `0..len`, since landing there would open a gap.
    pub fn new(from: i64, to: i64, len: i64) -> Option<Self> {
        if from == to {
            return Some(MovePlan::Stay);
        }
        let in_range = |i: i64| (0..len).contains(&i);
        if !in_range(from) || !in_range(to) {
            return None;
        }
        Some(if from < to {
            MovePlan::Forward { from, to }
        } else {
            MovePlan::Backward { from, to }
        })
    }

    /// Number of entries other than the moved one whose index changes.
    pub fn shifted(&self) -> usize {
        match *self {
            MovePlan::Stay => 0,
            MovePlan::Forward { from, to } | MovePlan::Backward { from, to } => {
                from.abs_diff(to) as usize
            }
        }
    }

    /// Index that the entry currently at `index` holds once the move is done.
    #[cfg(test)]
    pub fn apply(&self, index: i64) -> i64 {
        match *self {
            MovePlan::Stay => index,
            MovePlan::Forward { from, to } => {
                if index == from {
                    to
                } else if index > from && index <= to {
                    index - 1
                } else {
                    index
                }
            }
            MovePlan::Backward { from, to } => {
                if index == from {
                    to
                } else if index >= to && index < from {
                    index + 1
                } else {
                    index
                }
            }
        }
    }
}

/// True when `indices` is exactly `{0, .., n-1}` in some order.
#[cfg(test)]
pub fn is_dense(indices: &[i64]) -> bool {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(position, &index)| index == position as i64)
}
