//! Persistence adapter: snapshot export/restore and the optional on-disk
//! store.
//!
//! A [`Snapshot`] captures the shared text buffer, the string records, the
//! separator offsets, the id counter, the open-edge boundary and a flat dump
//! of the node arena. Suffix links and the transient construction state are
//! deliberately omitted: correct suffix links cannot be recovered from the
//! structure alone, so a restored tree approximates them (every internal
//! node links to the root), is marked degraded, and forces a full rebuild
//! from the retained strings before accepting new insertions. Queries never
//! follow suffix links and are unaffected.
//!
//! [`SnapshotStore`] adds file-backed storage with the following layout:
//!
//! ```text
//! [Header: 16 bytes]
//!   - Magic: "TGLS" (4 bytes)
//!   - Version: u32 (4 bytes)
//!   - Flags: u32 (4 bytes) - compression
//!   - Reserved: 4 bytes
//!
//! [Data: variable]
//!   - bincode-encoded Snapshot, optionally LZ4-compressed
//!
//! [Footer: 8 bytes]
//!   - CRC32 checksum of the data section: u32
//!   - Magic: "SLGT" (4 bytes)
//! ```

use crate::buffer::TextRegistry;
use crate::error::{Result, TagletError};
use crate::index::TagIndex;
use crate::tree::{Node, SuffixTree};
use crate::types::{Symbol, TagRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic bytes at the start of snapshot files
pub const MAGIC_HEADER: &[u8; 4] = b"TGLS";
/// Magic bytes at the end of snapshot files (reversed)
pub const MAGIC_FOOTER: &[u8; 4] = b"SLGT";
/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// One arena node as stored in a snapshot. Children are kept sorted by edge
/// symbol so exports are deterministic; suffix links are not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub start: usize,
    pub end: Option<usize>,
    pub suffix_index: Option<usize>,
    pub children: Vec<(Symbol, usize)>,
}

/// A versioned, self-contained image of a [`TagIndex`].
///
/// Opaque to callers: produce one with [`TagIndex::export`], revive it with
/// [`TagIndex::restore`], and store the bytes wherever convenient (or use
/// [`SnapshotStore`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    version: u32,
    text: Vec<Symbol>,
    records: Vec<TagRecord>,
    separator_offsets: Vec<usize>,
    next_reserved: u64,
    next_auto_id: u64,
    /// Buffer length at export time; open leaf edges end here.
    open_edge_end: usize,
    nodes: Vec<SnapshotNode>,
}

impl Snapshot {
    /// The snapshot's format version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Encode to bytes (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bytes, checking the format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes)
            .map_err(|e| TagletError::corrupted(format!("snapshot decode failed: {}", e)))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(TagletError::SnapshotVersionMismatch {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}

impl TagIndex {
    /// Export the index to a serializable snapshot.
    ///
    /// The construction state is quiescent between insertions, so nothing
    /// transient needs capturing; suffix links are dropped on purpose.
    pub fn export(&self) -> Snapshot {
        debug_assert!(self.tree.is_quiescent());

        let nodes = self
            .tree
            .nodes()
            .iter()
            .map(|node| {
                let mut children: Vec<(Symbol, usize)> =
                    node.children.iter().map(|(&sym, &id)| (sym, id)).collect();
                children.sort_unstable_by_key(|&(sym, _)| sym);
                SnapshotNode {
                    start: node.start,
                    end: node.end,
                    suffix_index: node.suffix_index,
                    children,
                }
            })
            .collect();

        debug!(
            strings = self.registry.string_count(),
            nodes = self.tree.node_count(),
            "exported snapshot"
        );

        Snapshot {
            version: SNAPSHOT_VERSION,
            text: self.registry.symbols().to_vec(),
            records: self.registry.records().to_vec(),
            separator_offsets: self.registry.separator_offsets().to_vec(),
            next_reserved: self.registry.next_reserved(),
            next_auto_id: self.next_auto_id,
            open_edge_end: self.registry.len(),
            nodes,
        }
    }

    /// Restore an index from a snapshot.
    ///
    /// Fails with [`TagletError::SnapshotVersionMismatch`] for unrecognized
    /// versions. The restored index answers queries identically to the
    /// exported one but is degraded: its first insertion rebuilds the
    /// automaton from the retained strings.
    pub fn restore(snapshot: Snapshot) -> Result<TagIndex> {
        snapshot.check_version()?;
        if snapshot.open_edge_end != snapshot.text.len() {
            return Err(TagletError::corrupted(
                "open-edge boundary disagrees with text length",
            ));
        }

        let node_count = snapshot.nodes.len();
        let nodes: Vec<Node> = snapshot
            .nodes
            .iter()
            .map(|stored| {
                let children: HashMap<Symbol, usize> =
                    stored.children.iter().copied().collect();
                if children.values().any(|&id| id >= node_count) {
                    return Err(TagletError::corrupted("child index out of bounds"));
                }
                Ok(Node {
                    start: stored.start,
                    end: stored.end,
                    children,
                    suffix_link: None, // approximated below
                    suffix_index: stored.suffix_index,
                })
            })
            .collect::<Result<_>>()?;
        if nodes.is_empty() {
            return Err(TagletError::corrupted("snapshot has no root node"));
        }

        info!(
            strings = snapshot.records.len(),
            nodes = node_count,
            "restored snapshot; tree marked degraded"
        );

        Ok(TagIndex {
            registry: TextRegistry::from_parts(
                snapshot.text,
                snapshot.records,
                snapshot.separator_offsets,
                snapshot.next_reserved,
            ),
            tree: SuffixTree::from_restored_nodes(nodes),
            degraded: true,
            next_auto_id: snapshot.next_auto_id,
            default_limit: crate::search::DEFAULT_RESULT_LIMIT,
            last_updated: None,
        })
    }
}

/// Flags for the snapshot file format
#[derive(Debug, Clone, Copy)]
struct StoreFlags(u32);

impl StoreFlags {
    const NONE: Self = StoreFlags(0);
    const COMPRESSED_LZ4: Self = StoreFlags(1);

    fn is_compressed(&self) -> bool {
        self.0 & 1 != 0
    }
}

/// Header structure for the snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreHeader {
    magic: [u8; 4],
    version: u32,
    flags: u32,
    reserved: [u8; 4],
}

impl StoreHeader {
    fn new(flags: StoreFlags) -> Self {
        StoreHeader {
            magic: *MAGIC_HEADER,
            version: SNAPSHOT_VERSION,
            flags: flags.0,
            reserved: [0; 4],
        }
    }

    fn validate(&self) -> Result<()> {
        if self.magic != *MAGIC_HEADER {
            return Err(TagletError::corrupted("invalid magic bytes in header"));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(TagletError::SnapshotVersionMismatch {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}

/// Manages persistence of snapshots to disk.
///
/// Writes are atomic (temp file + rename) and the previous snapshot is kept
/// as a `.bak` backup.
///
/// ## Example
///
/// ```rust,ignore
/// use taglet_core::{SnapshotStore, TagIndex};
///
/// let store = SnapshotStore::new("./data");
/// store.save(&index)?;
/// let restored = store.load()?;
/// ```
pub struct SnapshotStore {
    /// Base directory for snapshot files
    base_dir: PathBuf,

    /// Whether to use compression
    use_compression: bool,
}

impl SnapshotStore {
    /// Create a new store rooted at the given directory.
    ///
    /// The directory is created on the first save if it doesn't exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        SnapshotStore {
            base_dir: base_dir.as_ref().to_path_buf(),
            use_compression: true,
        }
    }

    /// Set whether to compress the data section when saving.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.use_compression = compress;
        self
    }

    /// Path to the main snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.base_dir.join("taglet.snap")
    }

    fn backup_path(&self) -> PathBuf {
        self.base_dir.join("taglet.snap.bak")
    }

    fn temp_path(&self) -> PathBuf {
        self.base_dir.join("taglet.snap.tmp")
    }

    /// Check if a snapshot file exists.
    pub fn exists(&self) -> bool {
        self.snapshot_path().exists()
    }

    /// Export the index and save the snapshot to disk.
    pub fn save(&self, index: &TagIndex) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;

        let snapshot = index.export();
        let bytes = snapshot.to_bytes()?;
        let flags = if self.use_compression {
            StoreFlags::COMPRESSED_LZ4
        } else {
            StoreFlags::NONE
        };
        let data = if self.use_compression {
            lz4_flex::compress_prepend_size(&bytes)
        } else {
            bytes
        };

        info!(
            path = %self.snapshot_path().display(),
            strings = index.len(),
            bytes = data.len(),
            "saving snapshot to disk"
        );

        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);

            let header_bytes = bincode::serialize(&StoreHeader::new(flags))?;
            writer.write_all(&header_bytes)?;
            writer.write_all(&data)?;

            let checksum = crc32fast::hash(&data);
            writer.write_all(&checksum.to_le_bytes())?;
            writer.write_all(MAGIC_FOOTER)?;
            writer.flush()?;
        }

        // Keep the previous snapshot around as a backup.
        let snapshot_path = self.snapshot_path();
        let backup_path = self.backup_path();
        if snapshot_path.exists() {
            let _ = fs::remove_file(&backup_path);
            let _ = fs::rename(&snapshot_path, &backup_path);
        }
        fs::rename(&temp_path, &snapshot_path)?;

        Ok(())
    }

    /// Load a snapshot from disk and restore an index from it.
    ///
    /// The returned index is degraded (see [`TagIndex::restore`]).
    pub fn load(&self) -> Result<TagIndex> {
        let snapshot_path = self.snapshot_path();
        if !snapshot_path.exists() {
            return Err(TagletError::SnapshotNotFound {
                path: snapshot_path,
            });
        }

        info!(path = %snapshot_path.display(), "loading snapshot from disk");

        let file = File::open(&snapshot_path)?;
        let file_len = file.metadata()?.len() as usize;
        let mut reader = BufReader::new(file);

        if file_len < 16 + 8 {
            return Err(TagletError::corrupted("snapshot file too short"));
        }

        let mut header_bytes = [0u8; 16];
        reader.read_exact(&mut header_bytes)?;
        let header: StoreHeader = bincode::deserialize(&header_bytes)?;
        header.validate()?;
        let flags = StoreFlags(header.flags);

        let data_len = file_len - 16 - 8;
        let mut data = vec![0u8; data_len];
        reader.read_exact(&mut data)?;

        let mut footer = [0u8; 8];
        reader.read_exact(&mut footer)?;
        let stored_checksum = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
        if &footer[4..8] != MAGIC_FOOTER {
            return Err(TagletError::corrupted("invalid footer magic bytes"));
        }
        let computed_checksum = crc32fast::hash(&data);
        if stored_checksum != computed_checksum {
            return Err(TagletError::corrupted(format!(
                "checksum mismatch: expected {:08x}, got {:08x}",
                stored_checksum, computed_checksum
            )));
        }

        let bytes = if flags.is_compressed() {
            lz4_flex::decompress_size_prepended(&data)
                .map_err(|e| TagletError::corrupted(format!("decompression failed: {}", e)))?
        } else {
            data
        };

        let snapshot = Snapshot::from_bytes(&bytes)?;
        TagIndex::restore(snapshot)
    }

    /// Load the stored snapshot, or return a new empty index if loading
    /// fails. Logs a warning on failure.
    pub fn load_or_new(&self) -> TagIndex {
        match self.load() {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "failed to load snapshot, starting fresh");
                TagIndex::new()
            }
        }
    }

    /// Delete all stored snapshot data.
    pub fn clear(&self) -> Result<()> {
        for path in [self.snapshot_path(), self.backup_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Restore from the backup file if the main snapshot is unusable.
    pub fn restore_from_backup(&self) -> Result<TagIndex> {
        let backup_path = self.backup_path();
        if !backup_path.exists() {
            return Err(TagletError::SnapshotNotFound { path: backup_path });
        }
        fs::copy(&backup_path, self.snapshot_path())?;
        self.load()
    }
}
