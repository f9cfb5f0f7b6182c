//! Table building: turning the run list into the packed node sequence.
//!
//! Each run maps to nodes independently of every other run, so large run
//! lists are sharded into contiguous chunks and built on worker threads,
//! then concatenated in run order.

use crate::codec::node::{PackedField, PackedNode};
use crate::codec::runs::Run;

/// Below this many runs the sharding overhead outweighs the work.
const PARALLEL_MIN_RUNS: usize = 1 << 16;

/// Append the nodes that encode `run` to `out`.
///
/// Skip nodes first, until the prefix fits the prefix field; then
/// signal/long pairs until the length fits the length field (only the
/// first signal carries the leftover prefix); then one standard node for
/// whatever length remains. A run whose length is consumed exactly by
/// saturated long nodes emits no standard node.
pub fn push_run_nodes<P: PackedField, L: PackedField>(
    run: &Run,
    out: &mut Vec<PackedNode<P, L>>,
) {
    let mut prefix = run.prefix;
    while prefix > P::MAX {
        let (node, consumed) = PackedNode::<P, L>::skip(prefix);
        out.push(node);
        prefix -= consumed;
    }

    let mut length = run.length;
    while length > L::MAX {
        out.push(PackedNode::<P, L>::signal(prefix));
        prefix = 0;
        let (node, consumed) = PackedNode::<P, L>::long_run(length, run.value);
        out.push(node);
        length -= consumed;
    }

    if length > 0 {
        out.push(PackedNode::<P, L>::standard(prefix, length, run.value));
    }
}

fn build_chunk<P: PackedField, L: PackedField>(runs: &[Run]) -> Vec<PackedNode<P, L>> {
    let mut nodes = Vec::with_capacity(runs.len());
    for run in runs {
        push_run_nodes(run, &mut nodes);
    }
    nodes
}

/// Build the full node sequence for `runs`, sharding across threads when
/// the list is large enough to be worth it.
pub fn build_nodes<P: PackedField, L: PackedField>(runs: &[Run]) -> Vec<PackedNode<P, L>> {
    let threads = num_cpus::get();
    if runs.len() < PARALLEL_MIN_RUNS || threads < 2 {
        return build_chunk(runs);
    }

    let chunk_size = runs.len().div_ceil(threads);
    std::thread::scope(|scope| {
        let handles: Vec<_> = runs
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || build_chunk::<P, L>(chunk)))
            .collect();

        let mut nodes = Vec::with_capacity(runs.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk_nodes) => nodes.extend(chunk_nodes),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        nodes
    })
}

/// Serialize a node sequence into its wire form.
pub fn encode_nodes<P: PackedField, L: PackedField>(nodes: &[PackedNode<P, L>]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(nodes.len() * PackedNode::<P, L>::SIZE);
    for node in nodes {
        node.encode_into(&mut bytes);
    }
    bytes
}
