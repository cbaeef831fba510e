//! File registry.
//!
//! Files are entered once by the driver, before any checking starts, and are
//! only read afterwards. `FileId` order is command-line order, which makes it
//! a stable tiebreaker for diagnostics.

use crate::StrictLevel;

/// Opaque handle into the [`FileTable`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct FileId(u32);

impl FileId {
    /// Sentinel for "no file" (synthesized locations).
    pub const NONE: FileId = FileId(u32::MAX);

    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        FileId(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this handle refers to a real file.
    #[inline]
    pub const fn exists(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Metadata for one source file.
#[derive(Clone, Debug)]
pub struct File {
    /// Path as given on the command line.
    pub path: String,
    /// Effective strictness the checker runs the file at.
    pub strict: StrictLevel,
    /// The sigil as written in the file. `StrictLevel::None` when the file
    /// has no sigil comment, even if the driver upgraded the effective level.
    pub sigil: StrictLevel,
    /// Whether signature overloading is permitted in this file.
    pub permit_overloads: bool,
}

/// Append-only registry of source files.
#[derive(Default)]
pub struct FileTable {
    files: Vec<File>,
}

impl FileTable {
    /// Create an empty table.
    pub fn new() -> Self {
        FileTable { files: Vec::new() }
    }

    /// Register a file and return its handle.
    pub fn enter_file(&mut self, file: File) -> FileId {
        let id = FileId::from_raw(u32::try_from(self.files.len()).expect("file table overflow"));
        self.files.push(file);
        id
    }

    /// Look up a file's metadata.
    pub fn get(&self, id: FileId) -> &File {
        &self.files[id.raw() as usize]
    }

    /// Effective strictness of a file; `Strong` for synthesized locations so
    /// nothing is ever suppressed on their account.
    pub fn strict_level(&self, id: FileId) -> StrictLevel {
        if id.exists() {
            self.get(id).strict
        } else {
            StrictLevel::Strong
        }
    }

    /// Whether a file may declare overloaded method signatures.
    pub fn permit_overload_definitions(&self, id: FileId) -> bool {
        id.exists() && self.get(id).permit_overloads
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
