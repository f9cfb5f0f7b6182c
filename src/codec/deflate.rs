//! Deflation: source bytes to container.
//!
//! The pipeline is detect runs, pick the node format with the best
//! savings, build and serialize the table, then write header, table, and
//! the residual literal stream into an output sized exactly in advance:
//!
//! ```text
//! output = 16 (header) + nodeCount * nodeSize + (input - encoded run bytes)
//! ```

use std::path::Path;

use crate::codec::format::select_format;
use crate::codec::header::{Header, HEADER_SIZE};
use crate::codec::node::{NodeFormat, PackedField};
use crate::codec::runs::{collect_runs, Run};
use crate::codec::table::{build_nodes, encode_nodes};
use crate::mapped::{MappedDest, MappedSource};
use crate::{Result, RleError};

/// Everything needed to lay out the container, computed before a single
/// output byte exists.
struct Plan {
    header: Header,
    table: Vec<u8>,
    runs: Vec<Run>,
    output_length: u64,
}

fn plan(data: &[u8]) -> Result<Plan> {
    let runs = collect_runs(data);
    let (format, savings) = select_format(&runs).ok_or(RleError::Inefficient)?;

    let table = match format {
        NodeFormat::P8L8 => encode_table::<u8, u8>(&runs)?,
        NodeFormat::P8L16 => encode_table::<u8, u16>(&runs)?,
        NodeFormat::P16L8 => encode_table::<u16, u8>(&runs)?,
        NodeFormat::P16L16 => encode_table::<u16, u16>(&runs)?,
    };
    let node_count = (table.len() / format.node_size()) as u32;

    let encoded: u64 = runs.iter().map(|run| run.length).sum();
    let output_length = HEADER_SIZE as u64 + table.len() as u64 + (data.len() as u64 - encoded);
    debug_assert_eq!(output_length, data.len() as u64 - savings as u64 + HEADER_SIZE as u64);

    Ok(Plan {
        header: Header {
            format,
            decompressed_length: data.len() as u64,
            node_count,
        },
        table,
        runs,
        output_length,
    })
}

fn encode_table<P: PackedField, L: PackedField>(runs: &[Run]) -> Result<Vec<u8>> {
    let nodes = build_nodes::<P, L>(runs);
    if nodes.len() > u32::MAX as usize {
        return Err(RleError::TableTooLarge);
    }
    Ok(encode_nodes(&nodes))
}

/// Write the planned container into `out`, which must be exactly
/// `plan.output_length` bytes.
fn write_container(data: &[u8], plan: &Plan, out: &mut [u8]) {
    plan.header.write_to(out);
    let table_end = HEADER_SIZE + plan.table.len();
    out[HEADER_SIZE..table_end].copy_from_slice(&plan.table);

    // Residual literal stream: every run's prefix is copied, its run bytes
    // skipped, and whatever follows the final run is the tail.
    let mut src = 0usize;
    let mut dst = table_end;
    for run in &plan.runs {
        let prefix = run.prefix as usize;
        out[dst..dst + prefix].copy_from_slice(&data[src..src + prefix]);
        src += prefix + run.length as usize;
        dst += prefix;
    }
    out[dst..].copy_from_slice(&data[src..]);
}

/// Deflate `data` into an in-memory container.
///
/// # Errors
/// `Inefficient` when no node format yields positive savings,
/// `TableTooLarge` when the node count overflows the header field.
pub fn deflate_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let plan = plan(data)?;
    let mut out = vec![0u8; plan.output_length as usize];
    write_container(data, &plan, &mut out);
    Ok(out)
}

/// Deflate the file at `input` into a container at `output`.
///
/// The output file is created at its exact final size and written through
/// a memory mapping. On failure its contents are undefined.
pub fn deflate_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let source = MappedSource::open(input)?;
    let data = source.bytes();

    let plan = plan(data)?;
    let mut dest = MappedDest::create(output, plan.output_length)?;
    write_container(data, &plan, dest.bytes_mut());
    dest.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_inefficient() {
        assert!(matches!(deflate_bytes(&[]), Err(RleError::Inefficient)));
    }

    #[test]
    fn test_all_literals_is_inefficient() {
        assert!(matches!(
            deflate_bytes(&[0x00, 0x01, 0x02, 0x03, 0x04]),
            Err(RleError::Inefficient)
        ));
    }

    #[test]
    fn test_single_run_container_layout() {
        // Ten 'A's: one standard P8L8 node, no residual.
        let out = deflate_bytes(&[0x41; 10]).unwrap();
        assert_eq!(out.len(), 19);

        let header = Header::parse(&out).unwrap();
        assert_eq!(header.format, NodeFormat::P8L8);
        assert_eq!(header.decompressed_length, 10);
        assert_eq!(header.node_count, 1);
        assert_eq!(&out[16..19], &[0, 10, 0x41]);
    }

    #[test]
    fn test_run_after_literals_keeps_prefix_in_residual() {
        let mut data = vec![0xAA, 0xBB, 0xCC];
        data.extend([0x5A; 100]);
        let out = deflate_bytes(&data).unwrap();
        assert_eq!(out.len(), 22);
        assert_eq!(&out[16..19], &[3, 100, 0x5A]);
        assert_eq!(&out[19..], &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_run_past_p8l8_length_selects_a_wider_length_field() {
        // 300 identical bytes fit one P8L16 standard node (4 table bytes),
        // beating a P8L8 signal/long pair (6 table bytes).
        let out = deflate_bytes(&[0xFF; 300]).unwrap();
        assert_eq!(out.len(), 20);
        let header = Header::parse(&out).unwrap();
        assert_eq!(header.format, NodeFormat::P8L16);
        assert_eq!(header.node_count, 1);
        assert_eq!(&out[16..20], &[0, 44, 1, 0xFF]);
    }

    #[test]
    fn test_long_prefix_selects_a_wider_prefix_field() {
        // A 300-byte literal gap fits P16L8's prefix field directly; no
        // skip node needed.
        let mut data: Vec<u8> = (0..300u32).map(|i| (i % 256) as u8).collect();
        data.extend([0x00; 10]);
        let out = deflate_bytes(&data).unwrap();
        assert_eq!(out.len(), 320);
        let header = Header::parse(&out).unwrap();
        assert_eq!(header.format, NodeFormat::P16L8);
        assert_eq!(header.node_count, 1);
        assert_eq!(&out[16..20], &[44, 1, 10, 0x00]);
        assert_eq!(&out[20..], &data[..300]);
    }

    #[test]
    fn test_signal_and_long_under_the_selected_format() {
        // Plenty of short runs keep P8L8 ahead overall, so the one long
        // run must go through a signal/long pair.
        let mut data = Vec::new();
        for i in 1..=20u8 {
            data.push(0xEE);
            data.extend(vec![i; 10]);
        }
        data.push(0xEE);
        data.extend([0xFF; 300]);
        let out = deflate_bytes(&data).unwrap();
        let header = Header::parse(&out).unwrap();
        assert_eq!(header.format, NodeFormat::P8L8);
        assert_eq!(header.node_count, 22);
        // the final two nodes: signal, then a long carrying 256 + 44
        let table_end = 16 + header.node_count as usize * 3;
        assert_eq!(&out[table_end - 6..table_end], &[1, 0, 0, 1, 44, 0xFF]);
    }

    #[test]
    fn test_skip_under_the_selected_format() {
        let mut data = Vec::new();
        for i in 1..=20u8 {
            data.extend(vec![i; 10]);
        }
        data.extend((0..300u32).map(|i| (i % 256) as u8));
        data.extend([0x00; 10]);
        let out = deflate_bytes(&data).unwrap();
        let header = Header::parse(&out).unwrap();
        assert_eq!(header.format, NodeFormat::P8L8);
        assert_eq!(header.node_count, 22);
        // the final two nodes: a skip consuming 44 | (1 << 8) = 300, then
        // the run node with no prefix left
        let table_end = 16 + header.node_count as usize * 3;
        assert_eq!(&out[table_end - 6..table_end], &[44, 0, 1, 0, 10, 0x00]);
    }

    #[test]
    fn test_output_length_formula_holds() {
        let mut data = Vec::new();
        for i in 0..50u8 {
            data.extend([i, i.wrapping_mul(7), 3]);
            data.extend(vec![i; 4 + i as usize]);
        }
        let out = deflate_bytes(&data).unwrap();
        let header = Header::parse(&out).unwrap();

        // Size the container independently from the run list: header,
        // node table, and every byte not covered by a run.
        let runs = collect_runs(&data);
        let run_bytes: u64 = runs.iter().map(|r| r.length).sum();
        let table_bytes = header.node_count as u64 * header.format.node_size() as u64;
        assert_eq!(
            out.len() as u64,
            16 + table_bytes + (data.len() as u64 - run_bytes)
        );
        assert_eq!(header.decompressed_length as usize, data.len());
    }

    #[test]
    fn test_noise_is_inefficient() {
        // A pattern with no run longer than three bytes cannot shrink.
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 7) as u8).collect();
        assert!(matches!(deflate_bytes(&data), Err(RleError::Inefficient)));
    }
}
