//! Package decompression
//!
//! Turns a compressed package into a decompressed byte stream. Arch packages
//! are zstd; gzip, xz, bzip2 and bare tar are accepted too.

use super::error::InstallError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, Write};
use std::path::Path;

const ZSTD_MAGIC: &[u8] = &[0x28, 0xB5, 0x2F, 0xFD];
const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const XZ_MAGIC: &[u8] = &[0xFD, b'7', b'z', b'X', b'Z', 0x00];
const BZIP2_MAGIC: &[u8] = b"BZh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Zstd,
    Gzip,
    Xz,
    Bzip2,
    None,
}

impl Compression {
    /// Detect from the file name extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".zst") || name.ends_with(".tzst") {
            Some(Compression::Zstd)
        } else if name.ends_with(".gz") || name.ends_with(".tgz") {
            Some(Compression::Gzip)
        } else if name.ends_with(".xz") || name.ends_with(".txz") {
            Some(Compression::Xz)
        } else if name.ends_with(".bz2") || name.ends_with(".tbz2") {
            Some(Compression::Bzip2)
        } else if name.ends_with(".tar") {
            Some(Compression::None)
        } else {
            None
        }
    }

    /// Detect from leading magic bytes; anything unknown is treated as bare tar.
    pub fn from_magic(head: &[u8]) -> Self {
        if head.starts_with(ZSTD_MAGIC) {
            Compression::Zstd
        } else if head.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else if head.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if head.starts_with(BZIP2_MAGIC) {
            Compression::Bzip2
        } else {
            Compression::None
        }
    }

    /// Extension first, then magic bytes.
    pub fn detect(path: &Path) -> io::Result<Self> {
        if let Some(found) = Self::from_path(path) {
            return Ok(found);
        }
        let mut head = Vec::with_capacity(XZ_MAGIC.len());
        File::open(path)?
            .take(XZ_MAGIC.len() as u64)
            .read_to_end(&mut head)?;
        Ok(Self::from_magic(&head))
    }

    /// Wrap a compressed reader in the matching decoder.
    pub fn decoder<'a, R: BufRead + 'a>(self, reader: R) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::with_buffer(reader)?),
            Compression::Gzip => Box::new(flate2::bufread::MultiGzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::bufread::XzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::bufread::MultiBzDecoder::new(reader)),
            Compression::None => Box::new(reader),
        })
    }
}

/// Stream-decompress `reader` into `writer`, returning the decompressed size.
pub fn decompress<R: BufRead, W: Write>(
    compression: Compression,
    reader: R,
    writer: &mut W,
) -> io::Result<u64> {
    let mut decoder = compression.decoder(reader)?;
    io::copy(&mut decoder, writer)
}

/// Decompress a package into an anonymous temporary file, rewound to the start.
///
/// The file is deleted by the OS once dropped.
pub fn decompress_to_scratch(package: &Path) -> Result<File, InstallError> {
    let read_err = |source| InstallError::Read {
        path: package.to_path_buf(),
        source,
    };
    let decompress_err = |source| InstallError::Decompress {
        path: package.to_path_buf(),
        source,
    };

    let compression = Compression::detect(package).map_err(read_err)?;
    let input = BufReader::new(File::open(package).map_err(read_err)?);
    let mut scratch = tempfile::tempfile().map_err(InstallError::Scratch)?;

    decompress(compression, input, &mut scratch).map_err(decompress_err)?;
    scratch.rewind().map_err(InstallError::Scratch)?;
    Ok(scratch)
}
