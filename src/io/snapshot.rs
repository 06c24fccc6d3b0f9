//! Node-state snapshots and result sinks.
//!
//! Binary layout written by [`BinarySnapshotWriter`], all little-endian:
//!
//! ```text
//! magic      4 bytes  "CFEM"
//! version    u32
//! name_len   u32, followed by the model name in UTF-8
//! time       f64
//! n_nodes    u64
//! n_vars     u32
//! per variable: u32 length + UTF-8 name
//! values     n_nodes × n_vars f64, row-major (node by node)
//! ```

use std::io::{BufWriter, Write};

use log::info;

use crate::error::FemError;

/// File magic.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"CFEM";
/// Layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Primary unknowns of one model at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub model: String,
    pub time: f64,
    pub variables: Vec<String>,
    pub n_nodes: usize,
    /// Row-major values, `n_nodes × variables.len()`
    pub values: Vec<f64>,
}

impl Snapshot {
    /// Value of variable `k` at node `i`.
    pub fn value(&self, i: usize, k: usize) -> f64 {
        self.values[i * self.variables.len() + k]
    }

    /// All values of one variable.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let k = self.variables.iter().position(|v| v == name)?;
        let n_vars = self.variables.len();
        Some((0..self.n_nodes).map(|i| self.values[i * n_vars + k]).collect())
    }
}

/// Receiver of snapshots.
pub trait ResultSink {
    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), FemError>;
}

/// Keeps snapshots in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub snapshots: Vec<Snapshot>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots of one model, in write order.
    pub fn for_model<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a Snapshot> + 'a {
        self.snapshots.iter().filter(move |s| s.model == model)
    }
}

impl ResultSink for MemorySink {
    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), FemError> {
        self.snapshots.push(snapshot.clone());
        Ok(())
    }
}

/// Writes snapshots in the binary layout above.
pub struct BinarySnapshotWriter<W: Write> {
    writer: BufWriter<W>,
    written: usize,
}

impl<W: Write> BinarySnapshotWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            written: 0,
        }
    }

    /// Number of snapshots written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, FemError> {
        self.writer
            .into_inner()
            .map_err(|e| FemError::Io(e.into_error()))
    }

    fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        self.writer.write_all(&(s.len() as u32).to_le_bytes())?;
        self.writer.write_all(s.as_bytes())
    }

    fn write_all(&mut self, s: &Snapshot) -> std::io::Result<()> {
        self.writer.write_all(SNAPSHOT_MAGIC)?;
        self.writer.write_all(&SNAPSHOT_VERSION.to_le_bytes())?;
        self.write_str(&s.model)?;
        self.writer.write_all(&s.time.to_le_bytes())?;
        self.writer.write_all(&(s.n_nodes as u64).to_le_bytes())?;
        self.writer
            .write_all(&(s.variables.len() as u32).to_le_bytes())?;
        for v in &s.variables {
            self.write_str(v)?;
        }
        for x in &s.values {
            self.writer.write_all(&x.to_le_bytes())?;
        }
        self.writer.flush()
    }
}

impl<W: Write> ResultSink for BinarySnapshotWriter<W> {
    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), FemError> {
        self.write_all(snapshot)?;
        self.written += 1;
        info!(
            "Wrote snapshot of {} at t = {} s ({} nodes)",
            snapshot.model, snapshot.time, snapshot.n_nodes
        );
        Ok(())
    }
}

/// Read one snapshot back from the binary layout.
pub fn read_snapshot(bytes: &[u8]) -> Option<(Snapshot, usize)> {
    let mut pos = 0usize;
    let mut take = |n: usize| -> Option<&[u8]> {
        let slice = bytes.get(pos..pos.checked_add(n)?)?;
        pos += n;
        Some(slice)
    };
    if take(4)? != SNAPSHOT_MAGIC {
        return None;
    }
    let version = u32::from_le_bytes(take(4)?.try_into().ok()?);
    if version != SNAPSHOT_VERSION {
        return None;
    }
    let name_len = u32::from_le_bytes(take(4)?.try_into().ok()?) as usize;
    let model = String::from_utf8(take(name_len)?.to_vec()).ok()?;
    let time = f64::from_le_bytes(take(8)?.try_into().ok()?);
    let n_nodes = u64::from_le_bytes(take(8)?.try_into().ok()?) as usize;
    let n_vars = u32::from_le_bytes(take(4)?.try_into().ok()?) as usize;
    // Header counts are untrusted; never reserve more than the input can hold
    let mut variables = Vec::with_capacity(n_vars.min(bytes.len() / 4));
    for _ in 0..n_vars {
        let len = u32::from_le_bytes(take(4)?.try_into().ok()?) as usize;
        variables.push(String::from_utf8(take(len)?.to_vec()).ok()?);
    }
    let total = n_nodes.checked_mul(n_vars)?;
    let mut values = Vec::with_capacity(total.min(bytes.len() / 8));
    for _ in 0..total {
        values.push(f64::from_le_bytes(take(8)?.try_into().ok()?));
    }
    Some((
        Snapshot {
            model,
            time,
            variables,
            n_nodes,
            values,
        },
        pos,
    ))
}
