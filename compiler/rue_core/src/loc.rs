//! Multi-file source locations.

use std::cmp::Ordering;
use std::fmt;

use crate::{FileId, FileTable, Span};

/// A [`Span`] qualified with the file it belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Loc {
    pub file: FileId,
    pub span: Span,
}

impl Loc {
    /// Location of synthesized constructs.
    pub const NONE: Loc = Loc {
        file: FileId::NONE,
        span: Span::DUMMY,
    };

    /// Create a new location.
    #[inline]
    pub const fn new(file: FileId, span: Span) -> Self {
        Loc { file, span }
    }

    /// Check whether this location points into a real file.
    #[inline]
    pub const fn exists(self) -> bool {
        self.file.exists()
    }

    /// Plain position order: file id, then begin offset, then end offset.
    ///
    /// Used to order merged work queues after the parallel walk.
    pub fn cmp_by_position(self, other: Loc) -> Ordering {
        (self.file, self.span.start, self.span.end).cmp(&(
            other.file,
            other.span.start,
            other.span.end,
        ))
    }

    /// Strictness-aware order: locations in stricter files sort first, ties
    /// broken by plain position.
    ///
    /// Used only when choosing which use-site reports a terminal resolution
    /// error: reporting in the strictest file prevents the error from being
    /// swallowed by a lax file's suppression rules.
    pub fn cmp_strictness_first(self, other: Loc, files: &FileTable) -> Ordering {
        let left = files.strict_level(self.file);
        let right = files.strict_level(other.file);
        // Inverted on purpose: stricter files come first.
        right
            .cmp(&left)
            .then_with(|| self.cmp_by_position(other))
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.exists() {
            write!(f, "file#{}:{}", self.file.raw(), self.span)
        } else {
            write!(f, "<synthetic>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{File, StrictLevel};

    fn file(files: &mut FileTable, strict: StrictLevel) -> FileId {
        files.enter_file(File {
            path: format!("f{}.rue", files.len()),
            strict,
            sigil: strict,
            permit_overloads: false,
        })
    }

    #[test]
    fn test_position_order_is_file_major() {
        let a = Loc::new(FileId::from_raw(0), Span::new(50, 60));
        let b = Loc::new(FileId::from_raw(1), Span::new(0, 1));
        assert_eq!(a.cmp_by_position(b), Ordering::Less);
    }

    #[test]
    fn test_strictness_order_prefers_strict_files() {
        let mut files = FileTable::new();
        let lax = file(&mut files, StrictLevel::False);
        let strict = file(&mut files, StrictLevel::Strict);

        let in_lax = Loc::new(lax, Span::new(0, 1));
        let in_strict = Loc::new(strict, Span::new(0, 1));
        assert_eq!(in_strict.cmp_strictness_first(in_lax, &files), Ordering::Less);
        assert_eq!(in_lax.cmp_strictness_first(in_strict, &files), Ordering::Greater);
    }
}
