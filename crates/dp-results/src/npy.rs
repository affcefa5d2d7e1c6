//! Minimal NumPy `.npy` codec for 1-D little-endian `f64` arrays.
//!
//! Layout (format version 1.0):
//! - 6-byte magic `\x93NUMPY`, 2 version bytes
//! - u16 LE header length (u32 for versions 2.0/3.0)
//! - ASCII dict header, space padded and newline terminated so that the
//!   data starts on a 64-byte boundary
//! - raw `<f8` data in C order

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{ResultsError, ResultsResult};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;
/// Magic + version + u16 header length.
const PREAMBLE_V1: usize = 10;
/// Magic + version + u32 header length.
const PREAMBLE_V2: usize = 12;

fn invalid(message: impl Into<String>) -> ResultsError {
    ResultsError::InvalidContent {
        message: message.into(),
    }
}

fn header_for(len: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({len},), }}");
    let unpadded = PREAMBLE_V1 + dict.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;

    let mut header = dict.into_bytes();
    header.extend(std::iter::repeat_n(b' ', padding));
    header.push(b'\n');
    header
}

/// Encode `data` as a version 1.0 `.npy` stream.
pub fn encode_npy_f64<W: Write>(mut writer: W, data: &[f64]) -> ResultsResult<()> {
    let header = header_for(data.len());
    let header_len = u16::try_from(header.len()).map_err(|_| invalid("header too long"))?;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(&header)?;
    for v in data {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `data` to `path`, truncating any existing file.
pub fn write_npy_f64<P: AsRef<Path>>(path: P, data: &[f64]) -> ResultsResult<()> {
    let file = File::create(path)?;
    encode_npy_f64(BufWriter::new(file), data)
}

/// Decode a 1-D `<f8` array from `.npy` bytes.
pub fn decode_npy_f64(bytes: &[u8]) -> ResultsResult<Vec<f64>> {
    if bytes.len() < PREAMBLE_V1 || &bytes[..6] != MAGIC {
        return Err(invalid("missing .npy magic"));
    }

    let (header_start, header_len) = match bytes[6] {
        1 => (PREAMBLE_V1, u16::from_le_bytes([bytes[8], bytes[9]]) as usize),
        2 | 3 => {
            if bytes.len() < PREAMBLE_V2 {
                return Err(invalid("truncated header length"));
            }
            (
                PREAMBLE_V2,
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            )
        }
        v => return Err(invalid(format!("unsupported .npy version {v}"))),
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(invalid("truncated header"));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| invalid("header is not valid text"))?;

    let descr = dict_value(header, "descr").ok_or_else(|| invalid("missing descr"))?;
    if descr.trim_matches(|c| c == '\'' || c == '"') != "<f8" {
        return Err(invalid(format!("unsupported dtype {descr}")));
    }
    let fortran =
        dict_value(header, "fortran_order").ok_or_else(|| invalid("missing fortran_order"))?;
    if fortran != "False" {
        return Err(invalid("fortran-ordered arrays are not supported"));
    }
    let shape = dict_value(header, "shape").ok_or_else(|| invalid("missing shape"))?;
    let len = parse_1d_shape(shape)?;

    let expected = len
        .checked_mul(8)
        .ok_or_else(|| invalid(format!("shape ({len},) is too large")))?;
    let data = &bytes[data_start..];
    if data.len() != expected {
        return Err(invalid(format!(
            "expected {expected} data bytes for {len} values, found {}",
            data.len()
        )));
    }

    Ok(data
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

/// Read a 1-D `<f8` array from `path`.
pub fn read_npy_f64<P: AsRef<Path>>(path: P) -> ResultsResult<Vec<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ResultsError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    decode_npy_f64(&bytes)
}

/// Raw text of `key`'s value in a Python dict literal.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let single = format!("'{key}'");
    let double = format!("\"{key}\"");
    let key_pos = header
        .find(&single)
        .map(|p| p + single.len())
        .or_else(|| header.find(&double).map(|p| p + double.len()))?;

    let rest = header[key_pos..].trim_start().strip_prefix(':')?.trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')')? + 1
    } else {
        rest.find([',', '}'])?
    };
    Some(rest[..end].trim())
}

fn parse_1d_shape(shape: &str) -> ResultsResult<usize> {
    let inner = shape
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| invalid(format!("malformed shape {shape}")))?;
    let dims: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    match dims.as_slice() {
        [n] => n
            .parse::<usize>()
            .map_err(|_| invalid(format!("malformed shape {shape}"))),
        _ => Err(invalid(format!("expected a 1-D shape, got {shape}"))),
    }
}
