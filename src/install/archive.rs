//! Tar archive reading
//!
//! Two passes over a seekable, already decompressed tar stream: one to list
//! entries, one to extract the chosen ones. Entries are matched between the
//! passes by their position in the archive.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// One archive member as listed by [`ArchiveReader::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position in enumeration order
    pub index: usize,
    /// Stored path, exactly as recorded in the archive
    pub path: PathBuf,
    /// Display form of `path`, without a trailing "/"
    pub name: String,
    pub size: u64,
}

/// Whether extracted files should get the archive's numeric uid/gid.
///
/// Only possible as root; anyone else keeps their own ownership.
pub fn can_preserve_ownership() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

pub struct ArchiveReader<R> {
    inner: R,
    preserve_ownership: bool,
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            preserve_ownership: can_preserve_ownership(),
        }
    }

    pub fn preserve_ownership(mut self, preserve: bool) -> Self {
        self.preserve_ownership = preserve;
        self
    }

    fn archive(&mut self) -> io::Result<tar::Archive<&mut R>> {
        self.inner.seek(SeekFrom::Start(0))?;
        let mut archive = tar::Archive::new(&mut self.inner);
        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);
        archive.set_preserve_ownerships(self.preserve_ownership);
        archive.set_overwrite(true);
        archive.set_unpack_xattrs(false);
        Ok(archive)
    }

    /// List every entry in archive order.
    pub fn entries(&mut self) -> io::Result<Vec<ArchiveEntry>> {
        let mut archive = self.archive()?;
        let mut listed = Vec::new();

        for (index, entry) in archive.entries_with_seek()?.enumerate() {
            let entry = entry?;
            let path = entry.path()?.into_owned();
            listed.push(ArchiveEntry {
                index,
                name: path.to_string_lossy().trim_end_matches('/').to_string(),
                path,
                size: entry.size(),
            });
        }

        Ok(listed)
    }

    /// Extract `wanted` (a subset of [`entries`](Self::entries), same order)
    /// under `root`.
    ///
    /// `after_each` is called once per wanted entry with the unpack result:
    /// `Ok(true)` extracted, `Ok(false)` refused because the path would land
    /// outside `root`, `Err` unpack failure. Only failing to read the archive
    /// itself aborts the pass.
    pub fn extract<F>(&mut self, wanted: &[ArchiveEntry], root: &Path, mut after_each: F) -> io::Result<()>
    where
        F: FnMut(&ArchiveEntry, io::Result<bool>),
    {
        let mut wanted = wanted.iter().peekable();
        let mut archive = self.archive()?;

        for (index, entry) in archive.entries_with_seek()?.enumerate() {
            let Some(next) = wanted.peek().copied() else {
                break;
            };
            let mut entry = entry?;
            if next.index != index {
                continue;
            }
            after_each(next, entry.unpack_in(root));
            wanted.next();
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Build an uncompressed tar in memory. Names ending in "/" become
    /// directories.
    pub(crate) fn build_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_uid(0);
            header.set_gid(0);
            if name.ends_with('/') {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder.append_data(&mut header, name, io::empty()).unwrap();
            } else {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, name, *data).unwrap();
            }
        }
        builder.into_inner().unwrap()
    }

    fn reader(files: &[(&str, &[u8])]) -> ArchiveReader<Cursor<Vec<u8>>> {
        ArchiveReader::new(Cursor::new(build_tar(files))).preserve_ownership(false)
    }

    #[test]
    fn test_entries_lists_names_and_sizes() {
        let mut r = reader(&[
            (".PKGINFO", b"pkgname = tool"),
            ("usr/", b""),
            ("usr/bin/", b""),
            ("usr/bin/tool", b"#!/bin/sh\necho hi\n"),
        ]);

        let entries = r.entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".PKGINFO", "usr", "usr/bin", "usr/bin/tool"]);
        assert_eq!(entries[0].size, 14);
        assert_eq!(entries[1].size, 0);
        assert_eq!(entries[3].size, 18);
        assert_eq!(entries[3].index, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_entries_keep_raw_stored_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let stored = Path::new(OsStr::from_bytes(b"usr/share/caf\xe9"));
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(1);
        builder.append_data(&mut header, stored, &b"x"[..]).unwrap();
        let mut r = ArchiveReader::new(Cursor::new(builder.into_inner().unwrap()))
            .preserve_ownership(false);

        let entries = r.entries().unwrap();
        assert_eq!(entries[0].path, stored);
        assert_eq!(entries[0].name, "usr/share/caf\u{FFFD}");
    }

    #[test]
    fn test_entries_can_be_listed_twice() {
        let mut r = reader(&[("a", b"1"), ("b", b"22")]);
        assert_eq!(r.entries().unwrap(), r.entries().unwrap());
    }

    #[test]
    fn test_extract_only_wanted_entries() {
        let mut r = reader(&[("a.txt", b"aaa"), ("dir/b.txt", b"bbbb"), ("c.txt", b"cc")]);
        let entries = r.entries().unwrap();
        let wanted = vec![entries[1].clone(), entries[2].clone()];
        let root = TempDir::new().unwrap();

        let mut seen = Vec::new();
        r.extract(&wanted, root.path(), |entry, result| {
            assert!(result.unwrap());
            seen.push(entry.name.clone());
        })
        .unwrap();

        assert_eq!(seen, vec!["dir/b.txt", "c.txt"]);
        assert!(!root.path().join("a.txt").exists());
        assert_eq!(std::fs::read(root.path().join("dir/b.txt")).unwrap(), b"bbbb");
        assert_eq!(std::fs::read(root.path().join("c.txt")).unwrap(), b"cc");
    }

    #[test]
    fn test_extract_all_matches_listed_sizes() {
        let files: &[(&str, &[u8])] = &[("x/1", b"one"), ("x/2", b"second"), ("x/3", b"")];
        let mut r = reader(files);
        let entries = r.entries().unwrap();
        let root = TempDir::new().unwrap();

        r.extract(&entries, root.path(), |_, result| assert!(result.unwrap()))
            .unwrap();

        let listed: u64 = entries.iter().map(|e| e.size).sum();
        let written: u64 = ["x/1", "x/2", "x/3"]
            .iter()
            .map(|p| std::fs::metadata(root.path().join(p)).unwrap().len())
            .sum();
        assert_eq!(listed, written);
    }

    #[test]
    fn test_extract_nothing_wanted() {
        let mut r = reader(&[("a", b"1")]);
        let root = TempDir::new().unwrap();
        let mut calls = 0;
        r.extract(&[], root.path(), |_, _| calls += 1).unwrap();
        assert_eq!(calls, 0);
        assert!(!root.path().join("a").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o755);
        header.set_size(2);
        builder.append_data(&mut header, "bin/tool", &b"hi"[..]).unwrap();
        let mut r = ArchiveReader::new(Cursor::new(builder.into_inner().unwrap()))
            .preserve_ownership(false);

        let entries = r.entries().unwrap();
        let root = TempDir::new().unwrap();
        r.extract(&entries, root.path(), |_, result| assert!(result.unwrap()))
            .unwrap();

        let mode = std::fs::metadata(root.path().join("bin/tool"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
