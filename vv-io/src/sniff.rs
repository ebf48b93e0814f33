//! Header sniffing and stdin staging
//!
//! Format detection only looks at the first few hundred bytes of an input.
//! Piped input cannot be rewound, so [`stage`] copies the sniffed head plus
//! the remainder of the stream into a temporary file that parsers re-open
//! from the start. The file is deleted when the returned [`StagedInput`] drops.

use crate::{IoError, Result};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::TempPath;

/// Number of leading bytes inspected by every signature check
pub const DEFAULT_HEADER_BYTES: usize = 200;

/// Coarse classification of a stream head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Xml,
    Vtk,
    Unknown,
}

impl FormatTag {
    /// Classify a stream head. Rules are ordered and the first match wins:
    /// a head starting with `<` (`<?xml`, `<DIF`, ...) is XML; one containing
    /// `# vtk DataFile`, `<VTKFile` or just `VTK` is VTK.
    pub fn classify(head: &[u8]) -> Self {
        if head.starts_with(b"<?xml") || head.starts_with(b"<DIF") || head.starts_with(b"<") {
            FormatTag::Xml
        } else if contains(head, b"# vtk DataFile")
            || contains(head, b"<VTKFile")
            || contains(head, b"VTK")
        {
            FormatTag::Vtk
        } else {
            FormatTag::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Xml => "xml",
            FormatTag::Vtk => "vtk",
            FormatTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte-substring search used by the signature checks
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Read up to `max_bytes` from the start of a file.
///
/// Unreadable files yield an empty header, which no signature matches.
pub fn read_header(path: &Path, max_bytes: usize) -> Vec<u8> {
    let mut head = Vec::with_capacity(max_bytes);
    match File::open(path) {
        Ok(file) => {
            if let Err(e) = file.take(max_bytes as u64).read_to_end(&mut head) {
                log::debug!("Could not read header of {}: {}", path.display(), e);
                head.clear();
            }
        }
        Err(e) => log::debug!("Could not open {} for sniffing: {}", path.display(), e),
    }
    head
}

/// A non-seekable input copied to disk, with the tag its head was sniffed as
#[derive(Debug)]
pub struct StagedInput {
    tag: FormatTag,
    header: Vec<u8>,
    path: TempPath,
}

impl StagedInput {
    pub fn tag(&self) -> FormatTag {
        self.tag
    }

    /// The sniffed head bytes
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// The sniffed head as text, for diagnostics
    pub fn header_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.header)
    }

    /// Location of the staged copy; valid while `self` is alive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file now, reporting failures
    pub fn close(self) -> Result<()> {
        self.path.close().map_err(|source| IoError::Staging { source })
    }
}

/// Sniff the head of `reader` and stage the whole stream into a temp file
pub fn stage<R: Read>(mut reader: R, max_bytes: usize) -> Result<StagedInput> {
    let staging = |source: io::Error| IoError::Staging { source };

    let mut header = Vec::with_capacity(max_bytes);
    reader
        .by_ref()
        .take(max_bytes as u64)
        .read_to_end(&mut header)
        .map_err(staging)?;
    let tag = FormatTag::classify(&header);

    let mut file = tempfile::Builder::new()
        .prefix("vvstdin")
        .tempfile()
        .map_err(staging)?;
    file.write_all(&header).map_err(staging)?;
    let copied = io::copy(&mut reader, &mut file).map_err(staging)?;
    file.flush().map_err(staging)?;

    let path = file.into_temp_path();
    log::debug!(
        "Staged {} bytes of input as {} (sniffed: {})",
        header.len() as u64 + copied,
        path.display(),
        tag
    );

    Ok(StagedInput { tag, header, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_classify_rules_in_order() {
        assert_eq!(FormatTag::classify(b"<?xml version=\"1.0\"?>"), FormatTag::Xml);
        assert_eq!(FormatTag::classify(b"<DIF><DIFBody/></DIF>"), FormatTag::Xml);
        // a leading '<' wins even when VTK appears later
        assert_eq!(FormatTag::classify(b"<VTKFile type=\"PolyData\">"), FormatTag::Xml);
        assert_eq!(FormatTag::classify(b"# vtk DataFile Version 3.0\n"), FormatTag::Vtk);
        assert_eq!(FormatTag::classify(b"some title mentioning VTK"), FormatTag::Vtk);
        assert_eq!(FormatTag::classify(b"#TriangulatedMeshVersion2.0"), FormatTag::Unknown);
        assert_eq!(FormatTag::classify(b""), FormatTag::Unknown);
    }

    #[test]
    fn test_stage_preserves_whole_stream() {
        let mut body = b"# vtk DataFile Version 3.0\n".to_vec();
        body.extend(std::iter::repeat(b'x').take(1000));

        let staged = stage(Cursor::new(body.clone()), 16).unwrap();
        assert_eq!(staged.tag(), FormatTag::Vtk);
        assert_eq!(staged.header(), &body[..16]);
        assert_eq!(std::fs::read(staged.path()).unwrap(), body);
    }

    #[test]
    fn test_stage_sniffs_within_limit() {
        let staged = stage(Cursor::new(b"# vtk DataFile Version 2.0\nx".to_vec()), 200).unwrap();
        assert_eq!(staged.tag(), FormatTag::Vtk);
        assert!(staged.header_lossy().starts_with("# vtk"));
    }

    #[test]
    fn test_staged_file_removed_on_drop() {
        let staged = stage(Cursor::new(b"<DIF/>".to_vec()), 200).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_read_header_of_missing_file_is_empty() {
        assert!(read_header(Path::new("/definitely/not/here.vtk"), 200).is_empty());
    }

    #[test]
    fn test_contains() {
        assert!(contains(b"abcVTKdef", b"VTK"));
        assert!(!contains(b"VT", b"VTK"));
        assert!(contains(b"", b""));
    }
}
