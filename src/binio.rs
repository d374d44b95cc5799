//! Framed-binary readers for grid and initial particle data (spec §6).
//!
//! Byte layout: a header of four `u32`s `(d0byte, charbytes, nvars,
//! mbytes_pervar)`, a UTF-8 metadata block of `charbytes` bytes, `nvars`
//! variable descriptors of `mbytes_pervar` bytes each (per descriptor:
//! 3 `u32`, 2 `char`, 1 `f64` scale factor), then the variable payloads
//! back to back in descriptor order. The core only consumes the decoded
//! structures this module produces, never the byte layout itself.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::gridboxmap::GridboxGeometry;
use crate::particle::{Particle, SoluteProperties};

const DESCRIPTOR_FIXED_LEN: usize = 3 * 4 + 2 * 1 + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DType {
    U32,
    U64,
    F64,
}

impl DType {
    fn from_code(code: u32) -> CoreResult<Self> {
        match code {
            0 => Ok(Self::U32),
            1 => Ok(Self::U64),
            2 => Ok(Self::F64),
            other => Err(CoreError::InputMalformed(format!(
                "unknown variable dtype code {other}"
            ))),
        }
    }

    fn elem_size(self) -> usize {
        match self {
            Self::U32 => 4,
            Self::U64 => 8,
            Self::F64 => 8,
        }
    }
}

#[derive(Debug, Clone)]
enum Payload {
    U32(Vec<u32>),
    U64(Vec<u64>),
    F64(Vec<f64>),
}

impl Payload {
    fn len(&self) -> usize {
        match self {
            Self::U32(v) => v.len(),
            Self::U64(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    fn as_u32(&self) -> CoreResult<&[u32]> {
        match self {
            Self::U32(v) => Ok(v),
            _ => Err(CoreError::InputMalformed("expected u32 variable".into())),
        }
    }

    fn as_u64(&self) -> CoreResult<&[u64]> {
        match self {
            Self::U64(v) => Ok(v),
            _ => Err(CoreError::InputMalformed("expected u64 variable".into())),
        }
    }

    fn as_f64(&self) -> CoreResult<&[f64]> {
        match self {
            Self::F64(v) => Ok(v),
            _ => Err(CoreError::InputMalformed("expected f64 variable".into())),
        }
    }
}

/// A decoded frame: the metadata text plus every variable, keyed by its
/// 2-character tag.
pub struct DecodedFrame {
    pub metadata: String,
    variables: HashMap<[u8; 2], Payload>,
}

impl DecodedFrame {
    fn get(&self, tag: &[u8; 2]) -> CoreResult<&Payload> {
        self.variables.get(tag).ok_or_else(|| {
            CoreError::InputMalformed(format!(
                "missing required variable '{}{}'",
                tag[0] as char, tag[1] as char
            ))
        })
    }
}

fn read_u32(bytes: &[u8], offset: &mut usize) -> CoreResult<u32> {
    let end = *offset + 4;
    let slice = bytes
        .get(*offset..end)
        .ok_or_else(|| CoreError::InputMalformed("unexpected end of frame".into()))?;
    *offset = end;
    Ok(u32::from_le_bytes(slice.try_into().unwrap()))
}

fn read_f64(bytes: &[u8], offset: &mut usize) -> CoreResult<f64> {
    let end = *offset + 8;
    let slice = bytes
        .get(*offset..end)
        .ok_or_else(|| CoreError::InputMalformed("unexpected end of frame".into()))?;
    *offset = end;
    Ok(f64::from_le_bytes(slice.try_into().unwrap()))
}

/// Parses one framed-binary buffer into its decoded variables.
pub fn decode_frame(bytes: &[u8]) -> CoreResult<DecodedFrame> {
    let mut offset = 0usize;
    let _d0byte = read_u32(bytes, &mut offset)?;
    let charbytes = read_u32(bytes, &mut offset)? as usize;
    let nvars = read_u32(bytes, &mut offset)? as usize;
    let mbytes_pervar = read_u32(bytes, &mut offset)? as usize;

    if mbytes_pervar < DESCRIPTOR_FIXED_LEN {
        return Err(CoreError::InputMalformed(format!(
            "descriptor size {mbytes_pervar} smaller than the minimum {DESCRIPTOR_FIXED_LEN}"
        )));
    }

    let metadata_bytes = bytes
        .get(offset..offset + charbytes)
        .ok_or_else(|| CoreError::InputMalformed("metadata block truncated".into()))?;
    let metadata = String::from_utf8(metadata_bytes.to_vec())
        .map_err(|e| CoreError::InputMalformed(format!("metadata is not valid UTF-8: {e}")))?;
    offset += charbytes;

    struct Descriptor {
        dtype: DType,
        count: u32,
        scale_factor: f64,
        tag: [u8; 2],
    }
    let mut descriptors = Vec::with_capacity(nvars);
    for _ in 0..nvars {
        let descriptor_start = offset;
        let dtype_code = read_u32(bytes, &mut offset)?;
        let count = read_u32(bytes, &mut offset)?;
        let _reserved = read_u32(bytes, &mut offset)?;
        let tag_bytes = bytes
            .get(offset..offset + 2)
            .ok_or_else(|| CoreError::InputMalformed("descriptor tag truncated".into()))?;
        let tag = [tag_bytes[0], tag_bytes[1]];
        offset += 2;
        let scale_factor = read_f64(bytes, &mut offset)?;
        offset = descriptor_start + mbytes_pervar;
        descriptors.push(Descriptor {
            dtype: DType::from_code(dtype_code)?,
            count,
            scale_factor,
            tag,
        });
    }

    let mut variables = HashMap::with_capacity(nvars);
    for d in descriptors {
        let nbytes = d.count as usize * d.dtype.elem_size();
        let slice = bytes
            .get(offset..offset + nbytes)
            .ok_or_else(|| CoreError::InputMalformed("variable payload truncated".into()))?;
        offset += nbytes;

        let payload = match d.dtype {
            DType::U32 => Payload::U32(
                slice
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            DType::U64 => Payload::U64(
                slice
                    .chunks_exact(8)
                    .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
                    .collect(),
            ),
            DType::F64 => Payload::F64(
                slice
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(c.try_into().unwrap()) * d.scale_factor)
                    .collect(),
            ),
        };
        variables.insert(d.tag, payload);
    }

    Ok(DecodedFrame { metadata, variables })
}

/// Decodes a grid frame into one [`GridboxGeometry`] per gridbox. Bounds
/// are stored as six contiguous `f64` per gridbox: `z_lo, z_hi, x_lo, x_hi,
/// y_lo, y_hi`.
pub fn decode_grid_frame(bytes: &[u8]) -> CoreResult<Vec<GridboxGeometry>> {
    let frame = decode_frame(bytes)?;
    let indices = frame.get(b"gi")?.as_u32()?;
    let bounds = frame.get(b"bd")?.as_f64()?;

    if bounds.len() != indices.len() * 6 {
        return Err(CoreError::InputMalformed(format!(
            "grid bounds length {} does not match 6 * gridbox count {}",
            bounds.len(),
            indices.len()
        )));
    }

    let mut geometries = Vec::with_capacity(indices.len());
    for (i, _gbxindex) in indices.iter().enumerate() {
        let b = &bounds[i * 6..i * 6 + 6];
        let (z_lo, z_hi, x_lo, x_hi, y_lo, y_hi) = (b[0], b[1], b[2], b[3], b[4], b[5]);
        let volume = (z_hi - z_lo) * (x_hi - x_lo) * (y_hi - y_lo);
        let area = (x_hi - x_lo) * (y_hi - y_lo);
        geometries.push(GridboxGeometry {
            z: (z_lo, z_hi),
            x: (x_lo, x_hi),
            y: (y_lo, y_hi),
            volume,
            area,
        });
    }
    Ok(geometries)
}

/// Decodes an initial-particle frame into owned [`Particle`]s, using a
/// single shared solute-properties value for every particle (the source
/// format does not carry per-particle solute identity).
pub fn decode_particle_frame(bytes: &[u8], solute: SoluteProperties) -> CoreResult<Vec<Particle>> {
    let frame = decode_frame(bytes)?;
    let sdgbxindex = frame.get(b"sx")?.as_u32()?;
    let multiplicity = frame.get(b"xi")?.as_u64()?;
    let radius = frame.get(b"rd")?.as_f64()?;
    let solute_mass = frame.get(b"ms")?.as_f64()?;
    let coord3 = frame.get(b"c3")?.as_f64()?;
    let coord1 = frame.get(b"c1")?.as_f64()?;
    let coord2 = frame.get(b"c2")?.as_f64()?;

    let n = sdgbxindex.len();
    let lens = [
        multiplicity.len(),
        radius.len(),
        solute_mass.len(),
        coord3.len(),
        coord1.len(),
        coord2.len(),
    ];
    if lens.iter().any(|&l| l != n) {
        return Err(CoreError::InputMalformed(
            "initial particle variable arrays have mismatched lengths".into(),
        ));
    }

    Ok((0..n)
        .map(|i| {
            Particle::new(
                sdgbxindex[i],
                coord3[i],
                coord1[i],
                coord2[i],
                solute,
                multiplicity[i],
                radius[i],
                solute_mass[i],
                None,
            )
        })
        .collect())
}
