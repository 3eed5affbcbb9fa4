//! Reader for NumPy `.npy` array files.
//!
//! Supports format versions 1.0 to 3.0, C-ordered arrays and the integer, bool and
//! float dtypes datasets are usually saved with. Values are widened to `f32`.

use thiserror::Error;

const MAGIC: &[u8] = b"\x93NUMPY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NpyError {
    #[error("missing .npy magic string")]
    BadMagic,
    #[error("unsupported .npy format version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("truncated file")]
    Truncated,
    #[error("malformed header: {0}")]
    Header(String),
    #[error("unsupported dtype {0}")]
    UnsupportedDtype(String),
    #[error("Fortran-ordered arrays are not supported")]
    FortranOrder,
    #[error("payload has {actual} bytes, shape needs {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Int,
    Uint,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dtype {
    kind: Kind,
    size: usize,
    big_endian: bool,
}

/// Decoded array: shape plus row-major values.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

impl NpyArray {
    /// Length of the leading axis (1 for scalars).
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Number of values per row.
    pub fn row_len(&self) -> usize {
        self.shape.iter().skip(1).product()
    }
}

pub fn parse(bytes: &[u8]) -> Result<NpyArray, NpyError> {
    if bytes.len() < MAGIC.len() + 2 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    let (major, minor) = (bytes[6], bytes[7]);
    let (header_len, header_start) = match major {
        1 => (read_u16(bytes, 8)? as usize, 10),
        2 | 3 => (read_u32(bytes, 8)? as usize, 12),
        _ => return Err(NpyError::UnsupportedVersion(major, minor)),
    };
    let header_end = header_start + header_len;
    let header = bytes
        .get(header_start..header_end)
        .ok_or(NpyError::Truncated)?;
    let header = std::str::from_utf8(header)
        .map_err(|_| NpyError::Header("header is not valid UTF-8".into()))?;

    let descr = dict_value(header, "descr")?;
    let dtype = parse_descr(unquote(descr)?)?;
    if dict_value(header, "fortran_order")?.trim() == "True" {
        return Err(NpyError::FortranOrder);
    }
    let shape = parse_shape(dict_value(header, "shape")?)?;

    let expected = shape
        .iter()
        .try_fold(dtype.size, |bytes, &dim| bytes.checked_mul(dim))
        .ok_or_else(|| NpyError::Header("shape too large".into()))?;
    let payload = &bytes[header_end..];
    if payload.len() < expected {
        return Err(NpyError::SizeMismatch {
            expected,
            actual: payload.len(),
        });
    }
    let values = payload[..expected]
        .chunks_exact(dtype.size)
        .map(|chunk| decode(dtype, chunk))
        .collect();
    Ok(NpyArray { shape, values })
}

/// Encode `values` as a version 1.0 little-endian `f4` array.
pub fn encode_f32(shape: &[usize], values: &[f32]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    encode_raw("<f4", shape, &payload)
}

/// Encode `values` as a version 1.0 little-endian `i8` array.
pub fn encode_i64(shape: &[usize], values: &[i64]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    encode_raw("<i8", shape, &payload)
}

fn encode_raw(descr: &str, shape: &[usize], payload: &[u8]) -> Vec<u8> {
    let dims = match shape {
        [single] => format!("{single},"),
        dims => dims
            .iter()
            .map(|dim| dim.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    };
    let mut header =
        format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': ({dims}), }}");
    // Total header block (magic + version + length + dict + newline) aligns to 64.
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut out = Vec::with_capacity(10 + header.len() + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, NpyError> {
    let raw = bytes.get(offset..offset + 2).ok_or(NpyError::Truncated)?;
    Ok(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, NpyError> {
    let raw = bytes.get(offset..offset + 4).ok_or(NpyError::Truncated)?;
    Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Raw text of `key`'s value in the header dict, up to the next top-level comma.
fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let needle_single = format!("'{key}'");
    let needle_double = format!("\"{key}\"");
    let key_at = header
        .find(&needle_single)
        .or_else(|| header.find(&needle_double))
        .ok_or_else(|| NpyError::Header(format!("missing key {key}")))?;
    let rest = &header[key_at + needle_single.len()..];
    let colon = rest
        .find(':')
        .ok_or_else(|| NpyError::Header(format!("missing value for {key}")))?;
    let rest = &rest[colon + 1..];
    let mut depth = 0usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' | '}' if depth == 0 => return Ok(rest[..idx].trim()),
            _ => {}
        }
    }
    Err(NpyError::Header(format!("unterminated value for {key}")))
}

fn unquote(raw: &str) -> Result<&str, NpyError> {
    raw.strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .ok_or_else(|| NpyError::Header(format!("expected quoted string, got {raw}")))
}

fn parse_descr(descr: &str) -> Result<Dtype, NpyError> {
    let unsupported = || NpyError::UnsupportedDtype(descr.to_string());
    if !descr.is_ascii() {
        return Err(unsupported());
    }
    let mut chars = descr.chars();
    let (big_endian, code) = match chars.next() {
        Some('<') | Some('|') | Some('=') => (false, chars.as_str()),
        Some('>') => (true, chars.as_str()),
        _ => (false, descr),
    };
    let (kind, size) = code.split_at(1.min(code.len()));
    let kind = match kind {
        "b" => Kind::Bool,
        "i" => Kind::Int,
        "u" => Kind::Uint,
        "f" => Kind::Float,
        _ => return Err(unsupported()),
    };
    let size: usize = size.parse().map_err(|_| unsupported())?;
    let valid = match kind {
        Kind::Bool => size == 1,
        Kind::Int | Kind::Uint => matches!(size, 1 | 2 | 4 | 8),
        Kind::Float => matches!(size, 4 | 8),
    };
    if !valid {
        return Err(unsupported());
    }
    Ok(Dtype {
        kind,
        size,
        big_endian,
    })
}

fn parse_shape(raw: &str) -> Result<Vec<usize>, NpyError> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| NpyError::Header(format!("bad shape {raw}")))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| NpyError::Header(format!("bad dimension {dim}")))
        })
        .collect()
}

fn decode(dtype: Dtype, chunk: &[u8]) -> f32 {
    let mut buf = [0u8; 8];
    buf[..chunk.len()].copy_from_slice(chunk);
    if dtype.big_endian {
        buf[..chunk.len()].reverse();
    }
    match (dtype.kind, dtype.size) {
        (Kind::Bool, _) | (Kind::Uint, 1) => buf[0] as f32,
        (Kind::Int, 1) => buf[0] as i8 as f32,
        (Kind::Int, 2) => i16::from_le_bytes([buf[0], buf[1]]) as f32,
        (Kind::Uint, 2) => u16::from_le_bytes([buf[0], buf[1]]) as f32,
        (Kind::Int, 4) => i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f32,
        (Kind::Uint, 4) => u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as f32,
        (Kind::Float, 4) => f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
        (Kind::Int, _) => i64::from_le_bytes(buf) as f32,
        (Kind::Uint, _) => u64::from_le_bytes(buf) as f32,
        (Kind::Float, _) => f64::from_le_bytes(buf) as f32,
    }
}
