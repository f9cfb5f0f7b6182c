//! Inflation: container back to the original bytes.
//!
//! The node table is decoded into logical runs by a two-state walk:
//! skips accumulate literal-prefix bytes, a signal captures its prefix and
//! claims the following node as a long, and standard nodes emit directly.
//! The runs are then replayed against the residual literal stream with
//! every cursor step bounds-checked; any disagreement with the recorded
//! decompressed length is a hard error.

use std::path::Path;

use crate::codec::header::{Header, HEADER_SIZE};
use crate::codec::node::{NodeFormat, NodeKind, PackedField, PackedNode};
use crate::codec::runs::Run;
use crate::mapped::{MappedDest, MappedSource};
use crate::{Result, RleError};

fn decode_table<P: PackedField, L: PackedField>(table: &[u8]) -> Result<Vec<Run>> {
    let mut runs = Vec::with_capacity(table.len() / PackedNode::<P, L>::SIZE);
    let mut pending_prefix: u64 = 0;

    let mut chunks = table.chunks_exact(PackedNode::<P, L>::SIZE);
    while let Some(chunk) = chunks.next() {
        let node = PackedNode::<P, L>::decode(chunk);
        match node.kind() {
            NodeKind::Skip => pending_prefix += node.skip_length(),
            NodeKind::Standard => {
                runs.push(Run {
                    prefix: pending_prefix + node.prefix.as_u64(),
                    length: node.length.as_u64(),
                    value: node.value,
                });
                pending_prefix = 0;
            }
            NodeKind::Signal => {
                let long = chunks.next().ok_or(RleError::TruncatedTable)?;
                let long = PackedNode::<P, L>::decode(long);
                runs.push(Run {
                    prefix: pending_prefix + node.prefix.as_u64(),
                    length: long.long_length(),
                    value: long.value,
                });
                pending_prefix = 0;
            }
        }
    }

    Ok(runs)
}

/// Parse the container framing: header, decoded run list, and the
/// residual literal stream that follows the table.
fn decode_container(data: &[u8]) -> Result<(Header, Vec<Run>, &[u8])> {
    let header = Header::parse(data)?;

    let table_bytes = header.node_count as u64 * header.format.node_size() as u64;
    let table_end = HEADER_SIZE as u64 + table_bytes;
    if table_end > data.len() as u64 {
        return Err(RleError::LengthMismatch);
    }
    let table = &data[HEADER_SIZE..table_end as usize];

    let runs = match header.format {
        NodeFormat::P8L8 => decode_table::<u8, u8>(table)?,
        NodeFormat::P8L16 => decode_table::<u8, u16>(table)?,
        NodeFormat::P16L8 => decode_table::<u16, u8>(table)?,
        NodeFormat::P16L16 => decode_table::<u16, u16>(table)?,
    };

    Ok((header, runs, &data[table_end as usize..]))
}

/// Replay `runs` against `residual`, filling `out` completely.
fn expand(runs: &[Run], residual: &[u8], out: &mut [u8]) -> Result<()> {
    let mut src = 0usize;
    let mut dst = 0usize;

    for run in runs {
        let src_left = (residual.len() - src) as u64;
        let dst_left = (out.len() - dst) as u64;
        if run.prefix > src_left || run.prefix > dst_left || run.length > dst_left - run.prefix {
            return Err(RleError::LengthMismatch);
        }
        let prefix = run.prefix as usize;
        let length = run.length as usize;

        out[dst..dst + prefix].copy_from_slice(&residual[src..src + prefix]);
        src += prefix;
        dst += prefix;

        out[dst..dst + length].fill(run.value);
        dst += length;
    }

    // The residual tail must land exactly on the end of the output.
    if residual.len() - src != out.len() - dst {
        return Err(RleError::LengthMismatch);
    }
    out[dst..].copy_from_slice(&residual[src..]);
    Ok(())
}

/// Inflate an in-memory container back into the original bytes.
///
/// # Errors
/// `NotRle` / `UnknownFormat` for a bad header, `TruncatedTable` when the
/// table ends inside a signal/long pair, `LengthMismatch` when the
/// streams do not add up to the recorded length.
pub fn inflate_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let (header, runs, residual) = decode_container(data)?;
    let mut out = vec![0u8; header.decompressed_length as usize];
    expand(&runs, residual, &mut out)?;
    Ok(out)
}

/// Inflate the container at `input` into the file at `output`.
pub fn inflate_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let source = MappedSource::open(input)?;
    let (header, runs, residual) = decode_container(source.bytes())?;

    let mut dest = MappedDest::create(output, header.decompressed_length)?;
    expand(&runs, residual, dest.bytes_mut())?;
    dest.flush()
}
