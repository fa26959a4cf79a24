//! Single-file index persistence.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! "DQIX" | u32 version | u64 header_len | header JSON
//!        | u64 count | u64 dimension | count * dimension f32
//!        | u64 xxhash64(everything above)
//! ```
//!
//! The JSON header carries the config, chunks and embedder state. Vectors are
//! stored as raw bits so they round-trip exactly.

use std::fs;
use std::hash::Hasher;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use twox_hash::XxHash64;

use docqa_core::types::{Chunk, EmbedderState, IndexConfig};
use docqa_core::{Error, Result};

use crate::index::Index;

pub const MAGIC: &[u8; 4] = b"DQIX";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct HeaderRef<'a> {
    config: &'a IndexConfig,
    chunks: &'a [Chunk],
    embedder_state: &'a EmbedderState,
}

#[derive(Deserialize)]
struct Header {
    config: IndexConfig,
    chunks: Vec<Chunk>,
    embedder_state: EmbedderState,
}

/// Write `index` to `path` atomically: the bytes go to a temporary file in
/// the same directory, which is then renamed over `path`.
pub fn save(index: &Index, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let bytes = encode(index)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), chunks = index.len(), "saved index");
    Ok(())
}

/// Read and validate an index file.
pub fn load(path: &Path) -> Result<Index> {
    let bytes = fs::read(path)?;
    let index = decode(path, &bytes)?;
    tracing::info!(path = %path.display(), chunks = index.len(), backend = %index.config().backend, "loaded index");
    Ok(index)
}

pub fn encode(index: &Index) -> Result<Vec<u8>> {
    let header = HeaderRef {
        config: index.config(),
        chunks: index.chunks(),
        embedder_state: index.embedder_state(),
    };
    let header = serde_json::to_vec(&header).map_err(|e| Error::InvalidIndex(format!("header: {e}")))?;
    let dimension = index.dimension();

    let mut buf = Vec::with_capacity(32 + header.len() + index.len() * dimension * 4);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    buf.extend_from_slice(&(header.len() as u64).to_le_bytes());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(&(index.len() as u64).to_le_bytes());
    buf.extend_from_slice(&(dimension as u64).to_le_bytes());
    for v in index.vectors() {
        for x in v {
            buf.extend_from_slice(&x.to_le_bytes());
        }
    }
    let checksum = checksum(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

/// Decode bytes read from `path` (used only in error messages).
pub fn decode(path: &Path, bytes: &[u8]) -> Result<Index> {
    let incompatible = |reason: String| Error::IncompatibleIndex { path: path.to_path_buf(), reason };

    if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
        return Err(incompatible("not a docqa index (bad magic)".into()));
    }
    let mut reader = Reader::new(path, bytes);
    reader.take(MAGIC.len())?;
    let version = reader.u32()?;
    if version != SCHEMA_VERSION {
        return Err(incompatible(format!(
            "schema version {version}, this build reads version {SCHEMA_VERSION}"
        )));
    }

    if bytes.len() < reader.pos + 8 {
        return Err(reader.corrupt("truncated before checksum"));
    }
    let (body, tail) = bytes.split_at(bytes.len() - 8);
    let stored = u64::from_le_bytes(tail.try_into().map_err(|_| reader.corrupt("short checksum"))?);
    if checksum(body) != stored {
        return Err(reader.corrupt("checksum mismatch"));
    }
    let mut reader = Reader { bytes: body, ..reader };

    let header_len = reader.len()?;
    let header: Header = serde_json::from_slice(reader.take(header_len)?)
        .map_err(|e| reader.corrupt(format!("header: {e}")))?;
    let count = reader.len()?;
    let dimension = reader.len()?;
    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| reader.corrupt("vector block size overflows"))?;
    if reader.remaining() != expected {
        return Err(reader.corrupt(format!(
            "vector block is {} bytes, expected {expected} for {count} x {dimension}",
            reader.remaining()
        )));
    }
    if count != header.chunks.len() {
        return Err(reader.corrupt(format!("{count} vectors for {} chunks", header.chunks.len())));
    }
    let raw = reader.take(expected)?;
    let vectors = if dimension == 0 {
        vec![Vec::new(); count]
    } else {
        raw.chunks_exact(dimension * 4)
            .map(|row| {
                row.chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect()
            })
            .collect()
    };

    Index::new(header.config, header.chunks, vectors, header.embedder_state).map_err(|e| match e {
        Error::InvalidIndex(reason) => reader.corrupt(reason),
        other => other,
    })
}

fn checksum(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

struct Reader<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(path: &'a Path, bytes: &'a [u8]) -> Self {
        Self { path, bytes, pos: 0 }
    }

    fn corrupt(&self, reason: impl Into<String>) -> Error {
        Error::CorruptIndex { path: PathBuf::from(self.path), reason: reason.into() }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(self.corrupt(format!("truncated at byte {} (needed {n} more)", self.pos)));
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn len(&mut self) -> Result<usize> {
        let b = self.take(8)?;
        let n = u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
        usize::try_from(n).map_err(|_| self.corrupt(format!("length {n} does not fit in memory")))
    }
}
