//! Binary PPM (P6) codec and pixel-layout conversion.
//!
//! Device-side images are 4-channel; files on disk are 3-channel P6.
//! The conversions are pure and total over any buffer whose length is
//! a multiple of the source channel count.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// An interleaved 8-bit pixel image.
///
/// Invariant: `pixels.len() == width * height * channels`, where
/// `channels` is 3 (RGB) or 4 (RGBA with a zero padding channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Load a binary PPM (P6) file.
    ///
    /// The header is the "P6" magic, `#` comments, whitespace-separated
    /// width and height, and a max-color value that must be 255; the
    /// raster is `width * height * 3` raw RGB bytes.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::ImageFileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let magic = header_token(&mut reader, path)?;
        if magic != "P6" {
            return Err(format_error(
                path,
                format!("bad magic '{magic}', only P6 supported"),
            ));
        }

        let width = header_number(&mut reader, path, "width")?;
        let height = header_number(&mut reader, path, "height")?;
        let max_color = header_number(&mut reader, path, "max color")?;
        if max_color != 255 {
            return Err(format_error(
                path,
                format!("max color {max_color}, should be 255"),
            ));
        }

        let mut pixels = vec![0u8; width * height * 3];
        reader
            .read_exact(&mut pixels)
            .map_err(|_| format_error(path, "truncated pixel data".into()))?;

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Write the image as binary PPM (P6).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let not_writable = |source| Error::ImageFileNotWritable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(not_writable)?;
        let mut writer = BufWriter::new(file);
        write!(writer, "P6\n{} {}\n255\n", self.width, self.height)
            .and_then(|_| writer.write_all(&self.pixels))
            .and_then(|_| writer.flush())
            .map_err(not_writable)
    }

    /// Expand 3-channel pixels to 4 channels with a zero padding byte.
    pub fn to_rgba(&self) -> Image {
        let mut pixels = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for px in self.pixels.chunks_exact(3) {
            pixels.extend_from_slice(px);
            pixels.push(0);
        }
        Image::new(self.width, self.height, pixels)
    }

    /// Drop the fourth channel of 4-channel pixels.
    pub fn to_rgb(&self) -> Image {
        let mut pixels = Vec::with_capacity(self.pixels.len() / 4 * 3);
        for px in self.pixels.chunks_exact(4) {
            pixels.extend_from_slice(&px[..3]);
        }
        Image::new(self.width, self.height, pixels)
    }
}

/// Next whitespace-delimited header token, with `#` comments skipped
/// through end of line.
fn next_token<R: Read>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut token = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        if reader.read(&mut byte)? == 0 {
            break;
        }
        match byte[0] {
            b'#' => {
                while reader.read(&mut byte)? == 1 && byte[0] != b'\n' {}
                if !token.is_empty() {
                    break;
                }
            }
            c if c.is_ascii_whitespace() => {
                if !token.is_empty() {
                    break;
                }
            }
            c => token.push(c),
        }
    }
    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&token).into_owned()))
    }
}

fn header_token<R: Read>(reader: &mut R, path: &Path) -> Result<String> {
    next_token(reader)
        .map_err(|_| format_error(path, "unreadable header".into()))?
        .ok_or_else(|| format_error(path, "missing header field".into()))
}

fn header_number<R: Read>(reader: &mut R, path: &Path, field: &str) -> Result<usize> {
    let token = header_token(reader, path)?;
    token
        .parse()
        .map_err(|_| format_error(path, format!("bad {field} '{token}'")))
}

fn format_error(path: &Path, reason: String) -> Error {
    Error::UnsupportedImageFormat {
        path: path.to_path_buf(),
        reason,
    }
}
