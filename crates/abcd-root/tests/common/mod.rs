//! Builds small ROOT files in memory, laid out the way ROOT 6 writes them.
#![allow(dead_code)]

use std::io::Write;

const BYTE_COUNT_MASK: u32 = 0x4000_0000;
const BEGIN: usize = 100;

/// A 1D histogram to be streamed as TH1D (or TH1F).
#[derive(Debug, Clone)]
pub struct HistFixture {
    pub name: String,
    pub title: String,
    pub x_min: f64,
    pub x_max: f64,
    /// Variable edges; `None` writes an empty fXbins (uniform axis).
    pub edges: Option<Vec<f64>>,
    /// In-range contents; under/overflow are filled with junk values.
    pub contents: Vec<f64>,
    pub sumw2: Option<Vec<f64>>,
    pub float: bool,
}

impl HistFixture {
    pub fn uniform(name: &str, x_min: f64, x_max: f64, contents: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            title: format!("{} title", name),
            x_min,
            x_max,
            edges: None,
            contents: contents.to_vec(),
            sumw2: None,
            float: false,
        }
    }

    pub fn with_edges(mut self, edges: &[f64]) -> Self {
        self.x_min = edges[0];
        self.x_max = edges[edges.len() - 1];
        self.edges = Some(edges.to_vec());
        self
    }

    pub fn with_sumw2(mut self, sumw2: &[f64]) -> Self {
        self.sumw2 = Some(sumw2.to_vec());
        self
    }

    pub fn as_float(mut self) -> Self {
        self.float = true;
        self
    }

    fn class_name(&self) -> &'static str {
        if self.float { "TH1F" } else { "TH1D" }
    }

    /// Streamed object bytes (what a TKey points at, before compression).
    pub fn payload(&self) -> Vec<u8> {
        let n_bins = self.contents.len();
        let n_cells = n_bins + 2;
        let mut cells = vec![-1000.0];
        cells.extend_from_slice(&self.contents);
        cells.push(2000.0);

        let mut buf = Vec::new();
        with_byte_count(&mut buf, 3, |b| {
            // TH1
            with_byte_count(b, 8, |b| {
                write_tnamed(b, &self.name, &self.title);
                with_byte_count(b, 2, |b| put_i16s(b, &[1, 1, 1]));
                with_byte_count(b, 2, |b| put_i16s(b, &[0, 1001]));
                with_byte_count(b, 2, |b| {
                    put_i16s(b, &[1, 1]);
                    b.extend_from_slice(&1.0f32.to_be_bytes());
                });
                b.extend_from_slice(&(n_cells as i32).to_be_bytes());
                write_taxis(b, "xaxis", n_bins, self.x_min, self.x_max, self.edges.as_deref());
                write_taxis(b, "yaxis", 1, 0.0, 1.0, None);
                write_taxis(b, "zaxis", 1, 0.0, 1.0, None);
                put_i16s(b, &[0, 1000]);
                let total: f64 = self.contents.iter().sum();
                // fEntries, fTsumw, fTsumw2, fTsumwx, fTsumwx2
                for v in [total, total, total, 0.0, 0.0] {
                    b.extend_from_slice(&v.to_be_bytes());
                }
                // fMaximum, fMinimum, fNormFactor
                for v in [-1111.0f64, -1111.0, 0.0] {
                    b.extend_from_slice(&v.to_be_bytes());
                }
                write_tarray_d(b, &[]);
                match &self.sumw2 {
                    Some(sw2) => {
                        let mut full = vec![9.0];
                        full.extend_from_slice(sw2);
                        full.push(9.0);
                        write_tarray_d(b, &full);
                    }
                    None => write_tarray_d(b, &[]),
                }
                write_string(b, "");
                // fFunctions: empty TList
                with_byte_count(b, 5, |b| {
                    write_tobject(b);
                    write_string(b, "");
                    b.extend_from_slice(&0u32.to_be_bytes());
                });
                // fBufferSize, fBuffer, fBinStatErrOpt, fStatOverflows
                b.extend_from_slice(&0i32.to_be_bytes());
                b.push(0);
                b.extend_from_slice(&0i32.to_be_bytes());
                b.extend_from_slice(&2i32.to_be_bytes());
            });
            b.extend_from_slice(&(n_cells as u32).to_be_bytes());
            for c in &cells {
                if self.float {
                    b.extend_from_slice(&(*c as f32).to_be_bytes());
                } else {
                    b.extend_from_slice(&c.to_be_bytes());
                }
            }
        });
        buf
    }
}

/// Top-level directory entry.
#[derive(Debug, Clone)]
pub enum Entry {
    Hist(HistFixture),
    Dir(String, Vec<HistFixture>),
}

/// Assembles a complete small-format ROOT file.
#[derive(Debug, Clone, Default)]
pub struct RootFileBuilder {
    entries: Vec<Entry>,
    compress: bool,
}

impl RootFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hist(mut self, h: HistFixture) -> Self {
        self.entries.push(Entry::Hist(h));
        self
    }

    pub fn dir(mut self, name: &str, hists: Vec<HistFixture>) -> Self {
        self.entries.push(Entry::Dir(name.to_string(), hists));
        self
    }

    /// Store object payloads as zlib blocks.
    pub fn compressed(mut self) -> Self {
        self.compress = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut f = Vec::new();
        f.extend_from_slice(b"root");
        put_u32(&mut f, 62206);
        put_u32(&mut f, BEGIN as u32);
        let end_at = f.len();
        put_u32(&mut f, 0); // fEND
        put_u32(&mut f, 0); // fSeekFree
        put_u32(&mut f, 0); // fNbytesFree
        put_u32(&mut f, 0); // nfree
        let nbytes_name_at = f.len();
        put_u32(&mut f, 0); // fNbytesName
        f.push(4); // fUnits
        put_u32(&mut f, if self.compress { 101 } else { 0 });
        put_u32(&mut f, 0); // fSeekInfo
        put_u32(&mut f, 0); // fNbytesInfo
        f.extend_from_slice(&[0u8; 18]);
        f.resize(BEGIN, 0);

        // Name record: TKey for the TFile itself, then fName/fTitle.
        let mut name_payload = Vec::new();
        write_string(&mut name_payload, "fixture.root");
        write_string(&mut name_payload, "");
        let name_record = key_record("TFile", "fixture.root", "", BEGIN, &name_payload, false);
        let nbytes_name = name_record.len();
        f.extend_from_slice(&name_record);
        patch_u32(&mut f, nbytes_name_at, nbytes_name as u32);

        let top_dir_at = f.len();
        f.extend_from_slice(&directory_streamer(nbytes_name as u32, 0, 0));

        let mut top_keys = Vec::new();
        for entry in &self.entries {
            match entry {
                Entry::Hist(h) => {
                    top_keys.push(self.write_object(&mut f, h.class_name(), &h.name, &h.title, &h.payload()));
                }
                Entry::Dir(name, hists) => {
                    let sub_keys: Vec<Vec<u8>> = hists
                        .iter()
                        .map(|h| self.write_object(&mut f, h.class_name(), &h.name, &h.title, &h.payload()))
                        .collect();
                    let (seek_keys, nbytes_keys) = write_key_list(&mut f, name, &sub_keys);
                    let streamer = directory_streamer(0, nbytes_keys, seek_keys);
                    top_keys.push(self.write_object(&mut f, "TDirectoryFile", name, name, &streamer));
                }
            }
        }

        let (seek_keys, nbytes_keys) = write_key_list(&mut f, "fixture.root", &top_keys);
        let top = directory_streamer(nbytes_name as u32, nbytes_keys, seek_keys);
        f[top_dir_at..top_dir_at + top.len()].copy_from_slice(&top);

        let end = f.len() as u32;
        patch_u32(&mut f, end_at, end);
        f
    }

    /// Append an object record; return its key header for the directory list.
    fn write_object(&self, f: &mut Vec<u8>, class: &str, name: &str, title: &str, payload: &[u8]) -> Vec<u8> {
        let seek = f.len();
        let record = key_record(class, name, title, seek, payload, self.compress);
        let key_len = key_header_len(class, name, title);
        let header = record[..key_len].to_vec();
        f.extend_from_slice(&record);
        header
    }
}

/// Write `header | payload` for one TKey, optionally as a single zlib block.
fn key_record(class: &str, name: &str, title: &str, seek: usize, payload: &[u8], compress: bool) -> Vec<u8> {
    let stored = if compress { zlib_block(payload) } else { payload.to_vec() };
    let key_len = key_header_len(class, name, title);
    let mut out = Vec::new();
    put_u32(&mut out, (key_len + stored.len()) as u32);
    out.extend_from_slice(&4u16.to_be_bytes());
    put_u32(&mut out, payload.len() as u32);
    put_u32(&mut out, 0x6b8a_0000); // fDatime
    out.extend_from_slice(&(key_len as u16).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    put_u32(&mut out, seek as u32);
    put_u32(&mut out, BEGIN as u32);
    write_string(&mut out, class);
    write_string(&mut out, name);
    write_string(&mut out, title);
    debug_assert_eq!(out.len(), key_len);
    out.extend_from_slice(&stored);
    out
}

fn key_header_len(class: &str, name: &str, title: &str) -> usize {
    4 + 2 + 4 + 4 + 2 + 2 + 4 + 4 + (1 + class.len()) + (1 + name.len()) + (1 + title.len())
}

/// Append a key list record; return `(seek_keys, nbytes_keys)`.
fn write_key_list(f: &mut Vec<u8>, dir_name: &str, keys: &[Vec<u8>]) -> (u32, u32) {
    let seek = f.len();
    let mut body = Vec::new();
    put_u32(&mut body, keys.len() as u32);
    for k in keys {
        body.extend_from_slice(k);
    }
    let record = key_record("TFile", dir_name, "", seek, &body, false);
    f.extend_from_slice(&record);
    (seek as u32, record.len() as u32)
}

/// TDirectory streamer, small-file variant (version 5, u32 seeks).
fn directory_streamer(nbytes_name: u32, nbytes_keys: u32, seek_keys: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&5u16.to_be_bytes());
    put_u32(&mut out, 0x6b8a_0000); // fDatimeC
    put_u32(&mut out, 0x6b8a_0000); // fDatimeM
    put_u32(&mut out, nbytes_keys);
    put_u32(&mut out, nbytes_name);
    put_u32(&mut out, BEGIN as u32); // fSeekDir
    put_u32(&mut out, 0); // fSeekParent
    put_u32(&mut out, seek_keys);
    // fUUID version + UUID
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&[0u8; 16]);
    out
}

fn zlib_block(payload: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(payload).unwrap();
    let compressed = enc.finish().unwrap();
    let mut out = Vec::with_capacity(9 + compressed.len());
    out.extend_from_slice(b"ZL");
    out.push(8);
    out.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&compressed);
    out
}

fn write_taxis(b: &mut Vec<u8>, name: &str, n_bins: usize, x_min: f64, x_max: f64, edges: Option<&[f64]>) {
    with_byte_count(b, 10, |b| {
        write_tnamed(b, name, "");
        // TAttAxis
        with_byte_count(b, 4, |b| {
            b.extend_from_slice(&510i32.to_be_bytes());
            put_i16s(b, &[1, 1, 42]);
            for v in [0.005f32, 0.035, 0.03, 1.0, 0.035] {
                b.extend_from_slice(&v.to_be_bytes());
            }
            put_i16s(b, &[1, 42]);
        });
        b.extend_from_slice(&(n_bins as i32).to_be_bytes());
        b.extend_from_slice(&x_min.to_be_bytes());
        b.extend_from_slice(&x_max.to_be_bytes());
        write_tarray_d(b, edges.unwrap_or(&[]));
        // fFirst, fLast, fBits2, fTimeDisplay, fTimeFormat, fLabels, fModLabs
        b.extend_from_slice(&0i32.to_be_bytes());
        b.extend_from_slice(&0i32.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.push(0);
        write_string(b, "");
        put_u32(b, 0);
        put_u32(b, 0);
    });
}

fn write_tnamed(b: &mut Vec<u8>, name: &str, title: &str) {
    with_byte_count(b, 1, |b| {
        write_tobject(b);
        write_string(b, name);
        write_string(b, title);
    });
}

fn write_tobject(b: &mut Vec<u8>) {
    b.extend_from_slice(&1u16.to_be_bytes());
    put_u32(b, 0);
    put_u32(b, 0x0300_0000);
}

fn write_tarray_d(b: &mut Vec<u8>, values: &[f64]) {
    put_u32(b, values.len() as u32);
    for v in values {
        b.extend_from_slice(&v.to_be_bytes());
    }
}

fn write_string(b: &mut Vec<u8>, s: &str) {
    if s.len() < 255 {
        b.push(s.len() as u8);
    } else {
        b.push(255);
        put_u32(b, s.len() as u32);
    }
    b.extend_from_slice(s.as_bytes());
}

/// Stream `body` behind a byte count and a version.
fn with_byte_count(b: &mut Vec<u8>, version: u16, body: impl FnOnce(&mut Vec<u8>)) {
    let start = b.len();
    put_u32(b, 0);
    b.extend_from_slice(&version.to_be_bytes());
    body(b);
    let count = (b.len() - start - 4) as u32;
    patch_u32(b, start, BYTE_COUNT_MASK | count);
}

fn put_i16s(b: &mut Vec<u8>, values: &[i16]) {
    for v in values {
        b.extend_from_slice(&v.to_be_bytes());
    }
}

fn put_u32(b: &mut Vec<u8>, v: u32) {
    b.extend_from_slice(&v.to_be_bytes());
}

fn patch_u32(b: &mut [u8], at: usize, v: u32) {
    b[at..at + 4].copy_from_slice(&v.to_be_bytes());
}
