//! Huffman decoding for EPWING pages.
//!
//! EPWING files carry a frequency table instead of a code table. The reader
//! rebuilds the decoding tree from the frequencies with a fixed greedy merge
//! order, so the tree shape (and therefore every code) must match the one the
//! authoring tool produced bit for bit.
//!
//! # Tree construction
//! 1. Sort the leaves by descending frequency with a selection sort that only
//!    swaps on a strictly greater frequency.
//! 2. Repeatedly take the lowest-frequency node (the last one in list order on
//!    ties) twice and append a branch `(first, second)` with the summed
//!    frequency, until one node is left.
//!
//! The tree is stored as an arena indexed by `usize`; it is immutable once
//! built and shared between streams behind an `Arc`.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::io::{self, Read};

use log::{debug, trace};

use crate::eb::types::error::{EbError, Result};

/// Payload width of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// End of page; the rest of the page is zero-filled.
    Eof,
    Bits8,
    Bits16,
    Bits32,
}

/// A leaf as read from the frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub kind: LeafKind,
    pub value: u32,
    pub frequency: u64,
}

impl Leaf {
    pub fn new(kind: LeafKind, value: u32, frequency: u64) -> Self {
        Self { kind, value, frequency }
    }

    /// The synthetic end-of-page leaf appended to every table.
    pub fn eof() -> Self {
        Self::new(LeafKind::Eof, 256, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Leaf { kind: LeafKind, value: u32 },
    Branch { left: usize, right: usize },
}

/// An immutable Huffman decoding tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    frequencies: Vec<u64>,
    root: usize,
}

impl HuffmanTree {
    /// Builds the decoding tree from a list of leaves.
    ///
    /// # Errors
    /// Returns `CorruptArchive` if `leaves` is empty.
    pub fn build(leaves: Vec<Leaf>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(EbError::corrupt("Huffman frequency table has no leaves"));
        }
        let leaf_count = leaves.len();
        let mut nodes = Vec::with_capacity(leaf_count * 2);
        let mut frequencies = Vec::with_capacity(leaf_count * 2);
        for leaf in &leaves {
            nodes.push(Node::Leaf { kind: leaf.kind, value: leaf.value });
            frequencies.push(leaf.frequency);
        }

        let order = selection_sort_descending(&frequencies);

        // Working list order is (original sorted rank, then append order); the
        // heap pops the lowest frequency and, on ties, the latest in that order.
        let mut heap: BinaryHeap<Reverse<(u64, Reverse<usize>, usize)>> = order
            .iter()
            .enumerate()
            .map(|(seq, &node)| Reverse((frequencies[node], Reverse(seq), node)))
            .collect();
        let mut seq = order.len();

        while heap.len() > 1 {
            let Some(Reverse((f1, _, first))) = heap.pop() else { break };
            let Some(Reverse((f2, _, second))) = heap.pop() else { break };
            let sum = f1 + f2;
            nodes.push(Node::Branch { left: first, right: second });
            frequencies.push(sum);
            heap.push(Reverse((sum, Reverse(seq), nodes.len() - 1)));
            seq += 1;
        }

        let root = match heap.pop() {
            Some(Reverse((_, _, root))) => root,
            None => return Err(EbError::corrupt("Huffman tree has no root")),
        };
        debug!(
            "Built Huffman tree: {} leaves, {} nodes, root frequency {}",
            leaf_count,
            nodes.len(),
            frequencies[root]
        );
        Ok(Self { nodes, frequencies, root })
    }

    /// Number of nodes (leaves and branches) in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Frequency of the root, i.e. the sum of every leaf frequency.
    pub fn total_frequency(&self) -> u64 {
        self.frequencies[self.root]
    }

    /// Decodes one page from `input` into `page`.
    ///
    /// Bits are consumed most-significant first; a `1` bit walks left and a
    /// `0` bit walks right. Multi-byte leaves are written big-endian and
    /// truncated at the end of `page`. The EOF leaf zero-fills the remainder.
    ///
    /// # Errors
    /// Returns `CorruptArchive` when `input` runs out before the page is
    /// complete or when a walk reaches a missing child.
    pub fn decode_page<R: Read>(&self, input: R, page: &mut [u8]) -> Result<()> {
        let mut bits = BitSource::new(input);
        let mut out = 0;

        while out < page.len() {
            let mut node = self.root;
            let (kind, value) = loop {
                match self.nodes.get(node) {
                    Some(Node::Leaf { kind, value }) => break (*kind, *value),
                    Some(Node::Branch { left, right }) => {
                        node = if bits.next_bit()? { *left } else { *right };
                    }
                    None => return Err(EbError::corrupt("Huffman walk reached a missing node")),
                }
            };

            let width = match kind {
                LeafKind::Eof => {
                    page[out..].fill(0);
                    trace!("Huffman page hit EOF leaf at {}", out);
                    return Ok(());
                }
                LeafKind::Bits8 => 1,
                LeafKind::Bits16 => 2,
                LeafKind::Bits32 => 4,
            };
            let bytes = value.to_be_bytes();
            let n = width.min(page.len() - out);
            page[out..out + n].copy_from_slice(&bytes[4 - width..4 - width + n]);
            out += n;
        }
        Ok(())
    }
}

/// Returns node indices in the order a first-maximum selection sort leaves them.
fn selection_sort_descending(frequencies: &[u64]) -> Vec<usize> {
    let len = frequencies.len();
    let mut slots: Vec<usize> = (0..len).collect();
    // Unsorted suffix keyed so the first entry is the highest frequency at the
    // lowest slot.
    let mut pending: BTreeSet<(Reverse<u64>, usize)> =
        (0..len).map(|slot| (Reverse(frequencies[slot]), slot)).collect();

    for i in 0..len.saturating_sub(1) {
        let Some((_, n)) = pending.pop_first() else { break };
        if n != i {
            let displaced = slots[i];
            pending.remove(&(Reverse(frequencies[displaced]), i));
            pending.insert((Reverse(frequencies[displaced]), n));
            slots.swap(i, n);
        }
    }
    slots
}

/// MSB-first bit reader over a byte source.
struct BitSource<R> {
    inner: R,
    buf: [u8; 2048],
    len: usize,
    pos: usize,
    bit: u8,
}

impl<R: Read> BitSource<R> {
    fn new(inner: R) -> Self {
        Self { inner, buf: [0; 2048], len: 0, pos: 0, bit: 7 }
    }

    fn next_bit(&mut self) -> Result<bool> {
        if self.pos >= self.len {
            self.len = loop {
                match self.inner.read(&mut self.buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(EbError::Io(e)),
                }
            };
            self.pos = 0;
            if self.len == 0 {
                return Err(EbError::corrupt("Huffman input ended before the page was complete"));
            }
        }
        let set = (self.buf[self.pos] >> self.bit) & 1 == 1;
        if self.bit == 0 {
            self.bit = 7;
            self.pos += 1;
        } else {
            self.bit -= 1;
        }
        Ok(set)
    }
}
