//! Result output.
//!
//! Snapshots of node state are handed to a [`ResultSink`]; the binary
//! writer produces a self-describing little-endian stream.

mod snapshot;

pub use snapshot::{
    BinarySnapshotWriter, MemorySink, ResultSink, SNAPSHOT_MAGIC, SNAPSHOT_VERSION, Snapshot,
    read_snapshot,
};
