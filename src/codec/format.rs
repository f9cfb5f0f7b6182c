//! Format scoring and selection.
//!
//! For each node format this predicts, in O(#runs) and without building
//! anything, exactly how many nodes the table builder will emit, and from
//! that the net bytes saved: run bytes removed from the literal stream
//! minus table bytes added. The format with the greatest positive savings
//! wins; if none saves anything the input is not worth deflating.

use crate::codec::node::{NodeFormat, PackedField, PackedNode};
use crate::codec::runs::Run;

/// Net bytes saved by encoding `run` under the `(P, L)` format: the run
/// length carried by its nodes minus the bytes those nodes occupy. Can be
/// negative for runs barely above the break-even threshold.
pub fn run_savings<P: PackedField, L: PackedField>(run: &Run) -> i64 {
    let node_size = PackedNode::<P, L>::SIZE as u64;
    let mut nodes: u64 = 0;

    // skip nodes for an overloaded prefix
    if run.prefix > P::MAX {
        let max_skip = PackedNode::<P, L>::MAX_SKIP;
        nodes += run.prefix / max_skip;
        if run.prefix % max_skip > P::MAX {
            nodes += 1;
        }
    }

    // signal+long pairs for an overloaded length
    let mut length = run.length;
    if length > L::MAX {
        let max_long = PackedNode::<P, L>::MAX_LONG;
        let pairs = length / max_long;
        let remainder = length % max_long;
        nodes += pairs * 2;
        length = remainder;
        if remainder > L::MAX {
            nodes += 2;
            length = 0;
        }
    }

    // a standard node carries whatever length is left
    if length > 0 {
        nodes += 1;
    }

    run.length as i64 - (nodes * node_size) as i64
}

/// Total savings for a run list under one format.
pub fn format_savings<P: PackedField, L: PackedField>(runs: &[Run]) -> i64 {
    runs.iter().map(run_savings::<P, L>).sum()
}

/// Score all four formats and return the best one with its savings, or
/// `None` when no format yields positive savings. Ties resolve to the
/// earliest format in [`NodeFormat::ALL`] order.
pub fn select_format(runs: &[Run]) -> Option<(NodeFormat, i64)> {
    let mut best: Option<(NodeFormat, i64)> = None;
    for format in NodeFormat::ALL {
        let savings = match format {
            NodeFormat::P8L8 => format_savings::<u8, u8>(runs),
            NodeFormat::P8L16 => format_savings::<u8, u16>(runs),
            NodeFormat::P16L8 => format_savings::<u16, u8>(runs),
            NodeFormat::P16L16 => format_savings::<u16, u16>(runs),
        };
        if savings > best.map_or(0, |(_, s)| s) {
            best = Some((format, savings));
        }
    }
    best
}
