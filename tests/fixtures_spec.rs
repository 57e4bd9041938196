use epwing_reader::{
    offset_of, page_of, position, BookReader, BookStream, ContainerKind, EbError, FileFormat,
    FileInfo, PlainTextHook, TextConfig,
};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write fixture");
    path
}

/// Deterministic, poorly compressible bytes.
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut x = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            (x >> 24) as u8
        })
        .collect()
}

/// Readable, highly compressible bytes.
fn prose(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog. "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}

fn read_all(stream: &mut BookStream) -> Vec<u8> {
    stream.seek(0);
    let mut out = vec![0u8; stream.logical_size() as usize];
    stream.read_fully(&mut out).expect("read whole stream");
    out
}

/// Reads every byte one at a time, crossing every cache boundary.
fn read_bytewise(stream: &mut BookStream) -> Vec<u8> {
    stream.seek(0);
    let mut out = Vec::new();
    let mut b = [0u8; 1];
    while let Some(n) = stream.read(&mut b).expect("read byte") {
        assert_eq!(n, 1, "single-byte read returned {} bytes", n);
        out.push(b[0]);
    }
    out
}

/// Checks random access, cache transparency and end-of-stream behaviour.
fn check_stream(info: Arc<FileInfo>, expected: &[u8]) {
    assert_eq!(
        info.logical_size,
        expected.len() as u64,
        "logical size of {}",
        info.path.display()
    );
    let mut stream = BookStream::open(info).expect("open stream");
    assert_eq!(read_all(&mut stream), expected, "bulk read");
    assert_eq!(read_bytewise(&mut stream), expected, "byte-at-a-time read");

    let size = expected.len() as u64;
    for pos in [0, 1, 2047, 2048, 2049, 4095, 4096, 4097, size / 2, size - 1] {
        if pos >= size {
            continue;
        }
        stream.seek(pos);
        let mut b = [0u8; 1];
        assert_eq!(stream.read(&mut b).unwrap(), Some(1));
        assert_eq!(b[0], expected[pos as usize], "byte at {:#x}", pos);
    }

    // Reads straddling a chunk boundary.
    stream.seek(2040);
    let mut buf = [0u8; 20];
    stream.read_fully(&mut buf).unwrap();
    assert_eq!(&buf[..], &expected[2040..2060]);

    // End of stream is a distinct signal, and clamping is silent.
    stream.seek(size + 100);
    assert_eq!(stream.position(), size);
    assert_eq!(stream.read(&mut buf).unwrap(), None);

    stream.seek(size - 3);
    assert_eq!(stream.read(&mut buf).unwrap(), Some(3));
    stream.seek(size - 3);
    assert!(matches!(
        stream.read_fully(&mut buf),
        Err(EbError::TruncatedRead { expected: 20, found: 3, .. })
    ));

    stream.close();
    stream.close();
    assert!(stream.is_closed());
}

// ---------------------------------------------------------------------------
// Plain
// ---------------------------------------------------------------------------

#[test]
fn plain_file_reads_through() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = noise(5000, 1);
    let path = write_fixture(dir.path(), "HONMON", &data);

    let info = FileInfo::open(&path, FileFormat::Plain).unwrap();
    assert_eq!(info.kind(), ContainerKind::Plain);
    assert_eq!(info.kind(), FileFormat::Plain.kind());
    assert_eq!(info.physical_size, 5000);
    assert_eq!(info.slice_size, 2048);
    check_stream(info, &data);
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = FileInfo::open(dir.path().join("nothing"), FileFormat::Plain).unwrap_err();
    assert!(matches!(err, EbError::NotFound { .. }), "got {:?}", err);
}

#[test]
fn std_io_traits_follow_the_logical_stream() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = prose(3000);
    let path = write_fixture(dir.path(), "START", &data);
    let mut stream = BookStream::open(FileInfo::open(&path, FileFormat::Plain).unwrap()).unwrap();

    assert_eq!(Seek::seek(&mut stream, SeekFrom::End(-4)).unwrap(), 2996);
    let mut tail = Vec::new();
    Read::read_to_end(&mut stream, &mut tail).unwrap();
    assert_eq!(tail, &data[2996..]);

    assert_eq!(Seek::seek(&mut stream, SeekFrom::Start(10_000)).unwrap(), 3000);
    assert!(Seek::seek(&mut stream, SeekFrom::Current(-4000)).is_err());

    stream.seek_page(2, 3);
    assert_eq!(stream.position(), 2051);
}

// ---------------------------------------------------------------------------
// EBZip
// ---------------------------------------------------------------------------

struct EbzipSlice {
    data: Vec<u8>,
    stored_raw: bool,
}

/// Builds an EBZip file. Each slice is either deflated or stored verbatim.
fn build_ebzip(level: u8, slices: &[EbzipSlice], logical_size: u64, checksum: u32) -> Vec<u8> {
    let slice_size = 2048usize << level;
    let width = if logical_size < 1 << 16 { 2 } else { 3 };

    let mut bodies = Vec::new();
    for slice in slices {
        assert_eq!(slice.data.len(), slice_size);
        if slice.stored_raw {
            bodies.push(slice.data.clone());
        } else {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::best());
            enc.write_all(&slice.data).unwrap();
            let body = enc.finish().unwrap();
            assert!(body.len() < slice_size, "fixture slice does not compress");
            bodies.push(body);
        }
    }

    let mut out = b"EBZip".to_vec();
    out.push(0x10 | level);
    out.extend_from_slice(&[0, 0, 0]);
    out.extend_from_slice(&logical_size.to_be_bytes()[3..]);
    out.extend_from_slice(&checksum.to_be_bytes());
    out.extend_from_slice(&0x5f00_0000u32.to_be_bytes());

    let mut offset = (22 + (slices.len() + 1) * width) as u64;
    for body in bodies.iter().map(Some).chain(std::iter::once(None)) {
        out.extend_from_slice(&offset.to_be_bytes()[8 - width..]);
        if let Some(body) = body {
            offset += body.len() as u64;
        }
    }
    for body in &bodies {
        out.extend_from_slice(body);
    }
    out
}

fn ebzip_fixture(dir: &Path, checksum: Option<u32>) -> (PathBuf, Vec<u8>) {
    // Level 1: 4096-byte slices; the middle slice is stored raw.
    let mut data = prose(4096);
    data.extend_from_slice(&noise(4096, 7));
    data.extend_from_slice(&prose(1500));
    let logical_size = data.len() as u64;

    let mut last = data[8192..].to_vec();
    last.resize(4096, 0);
    let slices = [
        EbzipSlice { data: data[..4096].to_vec(), stored_raw: false },
        EbzipSlice { data: data[4096..8192].to_vec(), stored_raw: true },
        EbzipSlice { data: last, stored_raw: false },
    ];
    let checksum = checksum.unwrap_or_else(|| adler2::adler32_slice(&data));
    let bytes = build_ebzip(1, &slices, logical_size, checksum);
    (write_fixture(dir, "honmon.ebz", &bytes), data)
}

#[test]
fn ebzip_slices_inflate_and_stored_slices_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (path, data) = ebzip_fixture(dir.path(), None);

    let info = FileInfo::open(&path, FileFormat::Ebzip).unwrap();
    assert_eq!(info.kind(), ContainerKind::DeflateSliced);
    assert_eq!(info.kind(), FileFormat::Ebzip.kind());
    assert_eq!(info.slice_size, 4096);
    check_stream(info.clone(), &data);

    let mut stream = BookStream::open(info).unwrap();
    stream.seek(123);
    stream.verify_checksum().unwrap();
    assert_eq!(stream.position(), 123, "checksum verification restores the position");
}

#[test]
fn ebzip_checksum_mismatch_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (path, _) = ebzip_fixture(dir.path(), Some(0x1234_5678));
    let mut stream = BookStream::open(FileInfo::open(&path, FileFormat::Ebzip).unwrap()).unwrap();
    match stream.verify_checksum() {
        Err(EbError::ChecksumMismatch { expected, .. }) => assert_eq!(expected, 0x1234_5678),
        other => panic!("expected checksum mismatch, got {:?}", other),
    }
}

#[test]
fn ebzip_slice_longer_than_slice_size_is_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut bytes = build_ebzip(
        0,
        &[EbzipSlice { data: prose(2048), stored_raw: true }],
        2048,
        0,
    );
    // Push the end offset one byte past a full slice.
    let end = u16::from_be_bytes([bytes[24], bytes[25]]) + 1;
    bytes[24..26].copy_from_slice(&end.to_be_bytes());
    bytes.push(0);
    let path = write_fixture(dir.path(), "bad.ebz", &bytes);

    let mut stream = BookStream::open(FileInfo::open(&path, FileFormat::Ebzip).unwrap()).unwrap();
    let mut b = [0u8; 1];
    assert!(matches!(stream.read(&mut b), Err(EbError::CorruptArchive(_))));
}

#[test]
fn ebzip_empty_or_inverted_slice_is_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = build_ebzip(
        0,
        &[EbzipSlice { data: prose(2048), stored_raw: false }],
        2048,
        0,
    );
    let start = u16::from_be_bytes([good[22], good[23]]);

    // End equal to start, then end before start.
    for end in [start, start - 1] {
        let mut bytes = good.clone();
        bytes[24..26].copy_from_slice(&end.to_be_bytes());
        let path = write_fixture(dir.path(), "bad.ebz", &bytes);

        let mut stream = BookStream::open(FileInfo::open(&path, FileFormat::Ebzip).unwrap()).unwrap();
        let mut b = [0u8; 1];
        match stream.read(&mut b) {
            Err(EbError::CorruptArchive(msg)) => assert!(msg.contains("invalid bounds"), "message: {}", msg),
            other => panic!("end {:#x} after start {:#x}: expected corrupt archive, got {:?}", end, start, other),
        }
    }
}

#[test]
fn ebzip_bad_magic_is_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "bad.ebz", b"EBzip\x10\0\0\0\0\0\0\x08\0\0\0\0\0\0\0\0\0");
    assert!(matches!(
        FileInfo::open(&path, FileFormat::Ebzip),
        Err(EbError::CorruptArchive(_))
    ));
}

// ---------------------------------------------------------------------------
// EPWING (Huffman pages)
// ---------------------------------------------------------------------------

/// Straightforward model of the tree construction, used to encode fixtures.
#[derive(Debug, Clone)]
enum RefNode {
    Leaf { width: usize, value: u32, freq: u64 },
    Branch { left: Box<RefNode>, right: Box<RefNode>, freq: u64 },
}

impl RefNode {
    fn freq(&self) -> u64 {
        match self {
            RefNode::Leaf { freq, .. } | RefNode::Branch { freq, .. } => *freq,
        }
    }
}

fn reference_tree(mut list: Vec<RefNode>) -> RefNode {
    let size = list.len();
    for i in 0..size.saturating_sub(1) {
        let mut n = i;
        for j in i + 1..size {
            if list[n].freq() < list[j].freq() {
                n = j;
            }
        }
        list.swap(i, n);
    }
    fn take_min(list: &mut Vec<RefNode>) -> RefNode {
        let mut n = 0;
        for i in 1..list.len() {
            if list[n].freq() >= list[i].freq() {
                n = i;
            }
        }
        list.remove(n)
    }
    while list.len() > 1 {
        let left = take_min(&mut list);
        let right = take_min(&mut list);
        let freq = left.freq() + right.freq();
        list.push(RefNode::Branch { left: Box::new(left), right: Box::new(right), freq });
    }
    list.remove(0)
}

/// Maps (width, value) to its code; width 0 is the EOF leaf.
fn collect_codes(node: &RefNode, prefix: Vec<bool>, codes: &mut HashMap<(usize, u32), Vec<bool>>) {
    match node {
        RefNode::Leaf { width, value, .. } => {
            codes.insert((*width, *value), prefix);
        }
        RefNode::Branch { left, right, .. } => {
            let mut l = prefix.clone();
            l.push(true);
            collect_codes(left, l, codes);
            let mut r = prefix;
            r.push(false);
            collect_codes(right, r, codes);
        }
    }
}

fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; (bits.len() + 7) / 8];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out
}

struct EpwingTables {
    leaf32: Vec<(u32, u16)>,
    leaf16: Vec<(u16, u16)>,
    leaf8: [u16; 256],
}

impl EpwingTables {
    fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (v, f) in &self.leaf32 {
            out.extend_from_slice(&v.to_be_bytes());
            out.extend_from_slice(&f.to_be_bytes());
        }
        for (v, f) in &self.leaf16 {
            out.extend_from_slice(&v.to_be_bytes());
            out.extend_from_slice(&f.to_be_bytes());
        }
        for f in &self.leaf8 {
            out.extend_from_slice(&f.to_be_bytes());
        }
        out
    }

    fn codes(&self) -> HashMap<(usize, u32), Vec<bool>> {
        let mut list = Vec::new();
        for (v, f) in &self.leaf32 {
            list.push(RefNode::Leaf { width: 4, value: *v, freq: *f as u64 });
        }
        for (v, f) in &self.leaf16 {
            list.push(RefNode::Leaf { width: 2, value: *v as u32, freq: *f as u64 });
        }
        for (v, f) in self.leaf8.iter().enumerate() {
            list.push(RefNode::Leaf { width: 1, value: v as u32, freq: *f as u64 });
        }
        list.push(RefNode::Leaf { width: 0, value: 256, freq: 1 });
        let mut codes = HashMap::new();
        collect_codes(&reference_tree(list), Vec::new(), &mut codes);
        codes
    }
}

/// Encodes one page greedily, preferring the widest leaf that matches.
/// Pages shorter than 2048 bytes end with the EOF code.
fn encode_page(page: &[u8], codes: &HashMap<(usize, u32), Vec<bool>>) -> Vec<u8> {
    let mut bits = Vec::new();
    let mut i = 0;
    while i < page.len() {
        let mut width = 1;
        for w in [4usize, 2] {
            if i + w <= page.len() {
                let value = page[i..i + w].iter().fold(0u32, |acc, b| acc << 8 | *b as u32);
                if codes.contains_key(&(w, value)) {
                    width = w;
                    break;
                }
            }
        }
        let value = page[i..i + width].iter().fold(0u32, |acc, b| acc << 8 | *b as u32);
        bits.extend_from_slice(&codes[&(width, value)]);
        i += width;
    }
    if page.len() < 2048 {
        bits.extend_from_slice(&codes[&(0, 256)]);
    }
    pack_bits(&bits)
}

/// Builds an EPWING file whose pages are `pages` (each at most 2048 bytes).
/// `raw_pages` marks V6 pages stored verbatim.
fn build_epwing(v6: bool, tables: &EpwingTables, pages: &[Vec<u8>], raw_pages: &[bool]) -> Vec<u8> {
    assert!(pages.len() < 16);
    let codes = tables.codes();
    let header_size = if v6 { 48 } else { 32 };
    let index_position = header_size as u32;
    let freq_position = index_position + 36;
    let freq = tables.bytes();
    let base = freq_position + freq.len() as u32;

    let mut bodies = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        let mut body = Vec::new();
        if v6 {
            if raw_pages[i] {
                body.push(1);
                let mut raw = page.clone();
                raw.resize(2048, 0);
                body.extend_from_slice(&raw);
                bodies.push(body);
                continue;
            }
            body.push(0);
        }
        body.extend_from_slice(&encode_page(page, &codes));
        bodies.push(body);
    }

    let mut out = Vec::new();
    for v in [index_position, 36, freq_position, freq.len() as u32] {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.resize(header_size, 0);

    out.extend_from_slice(&base.to_be_bytes());
    let mut offset = 0u16;
    for slot in 0..16 {
        if slot < pages.len() {
            out.extend_from_slice(&offset.to_be_bytes());
            offset += bodies[slot].len() as u16;
        } else {
            out.extend_from_slice(&0u16.to_be_bytes());
        }
    }
    out.extend_from_slice(&freq);
    for body in &bodies {
        out.extend_from_slice(body);
    }
    out
}

fn sample_leaf8() -> [u16; 256] {
    let mut leaf8 = [0u16; 256];
    for (i, f) in leaf8.iter_mut().enumerate() {
        *f = 1 + (i % 7) as u16;
    }
    for c in b"etaoin shrdlu" {
        leaf8[*c as usize] = 40;
    }
    leaf8
}

#[test]
fn epwing_pages_decode_through_the_tree() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = EpwingTables {
        leaf32: Vec::new(),
        leaf16: vec![(0x2422, 60), (0x1f0a, 30)],
        leaf8: sample_leaf8(),
    };
    let mut page0 = prose(2048);
    page0[100..102].copy_from_slice(&[0x24, 0x22]);
    let page1 = noise(2048, 3);
    let page2 = prose(700);
    let bytes = build_epwing(false, &tables, &[page0.clone(), page1.clone(), page2.clone()], &[]);
    let path = write_fixture(dir.path(), "HONMON", &bytes);

    let info = FileInfo::open(&path, FileFormat::Epwing).unwrap();
    assert_eq!(info.kind(), ContainerKind::HuffmanPaged);
    assert_eq!(info.kind(), FileFormat::Epwing.kind());
    let mut expected = page0;
    expected.extend_from_slice(&page1);
    expected.extend_from_slice(&page2);
    // The EOF leaf zero-fills the rest of the last page.
    expected.resize(3 * 2048, 0);
    check_stream(info, &expected);
}

#[test]
fn epwing6_stores_raw_pages_and_wide_leaves() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut leaf16 = vec![(0x2422u16, 20u16)];
    leaf16.resize(0x400, (0, 0));
    let tables = EpwingTables {
        leaf32: vec![(u32::from_be_bytes(*b"fox "), 90)],
        leaf16,
        leaf8: sample_leaf8(),
    };
    let page0 = prose(2048);
    let page1 = noise(2048, 11);
    let page2 = prose(1000);
    let bytes = build_epwing(
        true,
        &tables,
        &[page0.clone(), page1.clone(), page2.clone()],
        &[false, true, false],
    );
    let path = write_fixture(dir.path(), "HONMON2", &bytes);

    let info = FileInfo::open(&path, FileFormat::Epwing6).unwrap();
    assert_eq!(info.kind(), FileFormat::Epwing6.kind());
    let mut expected = page0;
    expected.extend_from_slice(&page1);
    expected.extend_from_slice(&page2);
    expected.resize(3 * 2048, 0);
    check_stream(info, &expected);
}

#[test]
fn huffman_tree_is_shared_and_rebuilt_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = EpwingTables { leaf32: Vec::new(), leaf16: Vec::new(), leaf8: sample_leaf8() };
    let page = prose(1200);
    let bytes = build_epwing(false, &tables, &[page.clone()], &[]);
    let path = write_fixture(dir.path(), "HONMON", &bytes);

    let first = FileInfo::open(&path, FileFormat::Epwing).unwrap();
    let second = FileInfo::open(&path, FileFormat::Epwing).unwrap();
    let (a, b) = match (&first.params, &second.params) {
        (epwing_reader::FormatParams::HuffmanPaged(a), epwing_reader::FormatParams::HuffmanPaged(b)) => (a, b),
        _ => panic!("not an EPWING file"),
    };
    assert_eq!(*a.tree, *b.tree);

    // Two streams over one FileInfo share the tree and decode independently.
    let mut s1 = BookStream::open(first.clone()).unwrap();
    let mut s2 = BookStream::open(first).unwrap();
    s2.seek(1000);
    let mut x = [0u8; 10];
    let mut y = [0u8; 10];
    s1.read_fully(&mut x).unwrap();
    s2.read_fully(&mut y).unwrap();
    assert_eq!(&x, &page[..10]);
    assert_eq!(&y, &page[1000..1010]);
}

#[test]
fn epwing_small_index_is_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut bytes = Vec::new();
    for v in [32u32, 35, 68, 512] {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes.resize(1024, 0);
    let path = write_fixture(dir.path(), "HONMON", &bytes);
    assert!(matches!(
        FileInfo::open(&path, FileFormat::Epwing),
        Err(EbError::CorruptArchive(_))
    ));
}

#[test]
fn epwing_truncated_bitstream_is_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = EpwingTables { leaf32: Vec::new(), leaf16: Vec::new(), leaf8: sample_leaf8() };
    let mut bytes = build_epwing(false, &tables, &[prose(2048)], &[]);
    bytes.truncate(bytes.len() - 200);
    let path = write_fixture(dir.path(), "HONMON", &bytes);

    let mut stream = BookStream::open(FileInfo::open(&path, FileFormat::Epwing).unwrap()).unwrap();
    let mut b = [0u8; 1];
    assert!(matches!(stream.read(&mut b), Err(EbError::CorruptArchive(_))));
}

// ---------------------------------------------------------------------------
// S-EBXA (LZ slices)
// ---------------------------------------------------------------------------

/// Encodes a 4096-byte slice using back-references to the byte `period`
/// positions earlier wherever they match, literals elsewhere.
fn lz_encode(slice: &[u8], period: usize) -> Vec<u8> {
    assert_eq!(slice.len(), 4096);
    let mut out = Vec::new();
    let mut p = 0;
    while p < slice.len() {
        let flag_at = out.len();
        out.push(0u8);
        let mut flags = 0u8;
        for unit in 0..8 {
            if p >= slice.len() {
                break;
            }
            let mut len = 0;
            if p >= period {
                while len < 18 && p + len < slice.len() && slice[p + len] == slice[p + len - period] {
                    len += 1;
                }
            }
            if len >= 3 {
                let value = (p - period + 4096 - 18) % 4096;
                out.push((value & 0xff) as u8);
                out.push((((value >> 8) << 4) | (len - 3)) as u8);
                p += len;
            } else {
                flags |= 1 << unit;
                out.push(slice[p]);
                p += 1;
            }
        }
        out[flag_at] = flags;
    }
    out
}

#[test]
fn sebxa_slices_and_pass_through_zones() {
    let dir = tempfile::tempdir().expect("tempdir");
    let prefix = noise(100, 5);
    let article_start = prefix.len() as u64;
    // Periodic content exercises overlapping copies.
    let slice0: Vec<u8> = b"abc".iter().cycle().take(4096).copied().collect();
    let slice1 = prose(4096);
    let mut slice2 = noise(500, 9);
    let article_end = article_start + 4096 * 2 + slice2.len() as u64;
    slice2.resize(4096, 0);

    let bodies = [lz_encode(&slice0, 3), lz_encode(&slice1, 45), lz_encode(&slice2, 1)];
    let index_position = article_start;
    let base_position = index_position + 8;

    let mut bytes = prefix.clone();
    let mut offset = bodies[0].len() as u32;
    for body in &bodies[1..] {
        bytes.extend_from_slice(&offset.to_be_bytes());
        offset += body.len() as u32;
    }
    for body in &bodies {
        bytes.extend_from_slice(body);
    }
    let path = write_fixture(dir.path(), "HONMON", &bytes);

    let format = FileFormat::Sebxa { index_position, base_position, article_start, article_end };
    let info = FileInfo::open(&path, format).unwrap();
    assert_eq!(info.kind(), ContainerKind::LzSliced);
    assert_eq!(info.kind(), format.kind());

    let mut expected = prefix;
    expected.extend_from_slice(&slice0);
    expected.extend_from_slice(&slice1);
    expected.extend_from_slice(&slice2[..500]);
    check_stream(info.clone(), &expected);

    // The prefix hands over to slice 0 at article_start, and the stream
    // ends with the compressed body.
    let mut stream = BookStream::open(info).unwrap();
    stream.seek(article_start - 4);
    let mut across = [0u8; 8];
    stream.read_fully(&mut across).unwrap();
    assert_eq!(&across[..], &expected[96..104]);
    assert_eq!(&across[4..], b"abca");

    stream.seek(article_end - 2);
    let mut tail = [0u8; 8];
    assert_eq!(stream.read(&mut tail).unwrap(), Some(2));
    assert_eq!(stream.read(&mut tail).unwrap(), None);
    assert_eq!(stream.position(), article_end);
}

#[test]
fn sebxa_rejects_inverted_zone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(dir.path(), "HONMON", &[0u8; 16]);
    let format = FileFormat::Sebxa { index_position: 0, base_position: 0, article_start: 10, article_end: 5 };
    assert!(matches!(FileInfo::open(&path, format), Err(EbError::CorruptArchive(_))));
}

// ---------------------------------------------------------------------------
// Positions and end-to-end text
// ---------------------------------------------------------------------------

#[test]
fn position_decomposes_into_page_and_offset() {
    for page in [1u64, 2, 3, 1000, 65_535] {
        for offset in [0u64, 1, 2046, 2047] {
            let pos = position(page, offset);
            assert_eq!(page_of(pos), page, "page of {:#x}", pos);
            assert_eq!(offset_of(pos), offset, "offset of {:#x}", pos);
        }
    }
}

#[test]
fn text_reads_through_a_compressed_container() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Heading "あ" then a line feed, then the body "あい" ended by 0x1f03.
    let mut text = vec![0x1f, 0x02, 0x24, 0x22, 0x1f, 0x0a, 0x24, 0x22, 0x24, 0x24, 0x1f, 0x03];
    text.resize(2048, 0);
    let tables = EpwingTables {
        leaf32: Vec::new(),
        leaf16: vec![(0x2422, 30), (0x1f0a, 5)],
        leaf8: sample_leaf8(),
    };
    let bytes = build_epwing(false, &tables, &[text], &[]);
    let path = write_fixture(dir.path(), "HONMON", &bytes);

    let stream = BookStream::open(FileInfo::open(&path, FileFormat::Epwing).unwrap()).unwrap();
    let mut reader = BookReader::new(stream, PlainTextHook::new(), TextConfig::default());
    assert_eq!(reader.read_heading(0).unwrap(), "\u{3042}");
    assert_eq!(reader.next_heading_position(0).unwrap(), Some(6));
    assert_eq!(reader.read_text(6).unwrap(), "\u{3042}\u{3044}");
}
