//! VTK XML PolyData (`.vtp`) reader
//!
//! Supports inline `ascii` and `binary` data arrays, with or without zlib
//! compression, in either byte order and with 32- or 64-bit block headers.
//! Multiple `<Piece>` elements are merged into one mesh.

use super::{cells_from_offsets, triangulate_polygon, triangulate_strip, Endian, PolyData, ScalarType};
use crate::{
    xml::{self, Element},
    IoError, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use std::io::Read;
use vv_core::{Face, TriangleMesh};

/// Width of the size fields preceding binary payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderType {
    UInt32,
    UInt64,
}

impl HeaderType {
    fn size(self) -> usize {
        match self {
            HeaderType::UInt32 => 4,
            HeaderType::UInt64 => 8,
        }
    }
}

/// File-wide settings from the `<VTKFile>` element
#[derive(Debug, Clone, Copy)]
struct Layout {
    endian: Endian,
    header: HeaderType,
    compressed: bool,
}

impl Layout {
    fn from_root(root: &Element) -> Result<Self> {
        let endian = match root.attribute("byte_order") {
            Some("BigEndian") => Endian::Big,
            Some("LittleEndian") | None => Endian::Little,
            Some(other) => return Err(IoError::parse(format!("unknown byte_order '{}'", other))),
        };
        let header = match root.attribute("header_type") {
            Some("UInt64") => HeaderType::UInt64,
            Some("UInt32") | None => HeaderType::UInt32,
            Some(other) => return Err(IoError::parse(format!("unknown header_type '{}'", other))),
        };
        let compressed = match root.attribute("compressor") {
            None | Some("") => false,
            Some("vtkZLibDataCompressor") => true,
            Some(other) => return Err(IoError::Unsupported(format!("compressor '{}'", other))),
        };
        Ok(Self {
            endian,
            header,
            compressed,
        })
    }

    fn read_size(&self, bytes: &[u8]) -> usize {
        match (self.header, self.endian) {
            (HeaderType::UInt32, Endian::Little) => LittleEndian::read_u32(bytes) as usize,
            (HeaderType::UInt32, Endian::Big) => BigEndian::read_u32(bytes) as usize,
            (HeaderType::UInt64, Endian::Little) => LittleEndian::read_u64(bytes) as usize,
            (HeaderType::UInt64, Endian::Big) => BigEndian::read_u64(bytes) as usize,
        }
    }
}

/// Parse a complete `.vtp` document held in memory
pub fn read_poly_data(data: &[u8]) -> Result<TriangleMesh> {
    let root = xml::parse_document(data)?;
    if root.name != "VTKFile" {
        return Err(IoError::InvalidFormat {
            format: format!("VTK XML (root element <{}>)", root.name),
        });
    }
    if let Some(kind) = root.attribute("type") {
        if kind != "PolyData" {
            return Err(IoError::Unsupported(format!("VTK XML dataset '{}'", kind)));
        }
    }
    let layout = Layout::from_root(&root)?;
    let poly_data = root
        .child("PolyData")
        .ok_or_else(|| IoError::parse("missing <PolyData> element"))?;

    let mut merged = PolyData::default();
    for piece in poly_data.children_named("Piece") {
        merged.merge(read_piece(piece, &layout)?);
    }
    Ok(merged.into_mesh())
}

fn read_piece(piece: &Element, layout: &Layout) -> Result<PolyData> {
    let mut poly = PolyData::default();
    let point_count = piece
        .attribute("NumberOfPoints")
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);

    if let Some(points) = piece.child("Points").and_then(|p| p.child("DataArray")) {
        let (_, coords) = read_array(points, layout)?;
        poly.set_points(&coords);
        if poly.points.len() != point_count {
            log::warn!(
                "Piece declares {} points but holds {}",
                point_count,
                poly.points.len()
            );
        }
    }

    if let Some(polys) = piece.child("Polys") {
        poly.faces.extend(read_cells(polys, layout, triangulate_polygon)?);
    }
    if let Some(strips) = piece.child("Strips") {
        poly.faces.extend(read_cells(strips, layout, triangulate_strip)?);
    }

    if let Some(point_data) = piece.child("PointData") {
        for array in point_data.children_named("DataArray") {
            let name = array.attribute("Name").unwrap_or("").to_string();
            let (components, values) = read_array(array, layout)?;
            poly.push_array(name, components, &values);
        }
    }
    Ok(poly)
}

fn read_cells(
    block: &Element,
    layout: &Layout,
    triangulate: fn(&[i64], &mut Vec<Face>),
) -> Result<Vec<Face>> {
    let named = |name: &str| block.children_named("DataArray").find(|a| a.attribute("Name") == Some(name));
    let (Some(connectivity), Some(offsets)) = (named("connectivity"), named("offsets")) else {
        return Ok(Vec::new());
    };
    let connectivity: Vec<i64> = read_array(connectivity, layout)?.1.iter().map(|&v| v as i64).collect();

    // Offsets are cell end positions; prepend the start of the first cell
    let mut boundaries = vec![0i64];
    boundaries.extend(read_array(offsets, layout)?.1.iter().map(|&v| v as i64));

    let mut faces = Vec::new();
    for cell in cells_from_offsets(&connectivity, &boundaries) {
        triangulate(cell?, &mut faces);
    }
    Ok(faces)
}

/// Decode one `<DataArray>` into its component count and values
fn read_array(array: &Element, layout: &Layout) -> Result<(usize, Vec<f64>)> {
    let type_name = array.attribute("type").unwrap_or("");
    let ty = ScalarType::from_xml_name(type_name)
        .ok_or_else(|| IoError::Unsupported(format!("DataArray type '{}'", type_name)))?;
    let components = array
        .attribute("NumberOfComponents")
        .map(|c| c.parse::<usize>())
        .transpose()
        .map_err(|_| IoError::parse("bad NumberOfComponents"))?
        .unwrap_or(1)
        .max(1);

    let values = match array.attribute("format").unwrap_or("ascii") {
        "ascii" => array
            .text()
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| IoError::parse(format!("bad ascii value '{}'", t)))
            })
            .collect::<Result<Vec<_>>>()?,
        "binary" => {
            let bytes = decode_binary(array.text(), layout)?;
            ty.decode(&bytes, layout.endian)
        }
        "appended" => return Err(IoError::Unsupported("appended VTK XML data".to_string())),
        other => return Err(IoError::parse(format!("unknown DataArray format '{}'", other))),
    };
    Ok((components, values))
}

/// Base64 length of `n` raw bytes, padding included
fn encoded_len(n: usize) -> Result<usize> {
    n.div_ceil(3)
        .checked_mul(4)
        .ok_or_else(|| IoError::parse("binary array header too large"))
}

/// Decode an inline `binary` payload into raw array bytes.
///
/// Writers either encode the size header and the data as one base64 stream or
/// as two back-to-back streams; both are accepted.
fn decode_binary(text: &str, layout: &Layout) -> Result<Vec<u8>> {
    let text: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let hsize = layout.header.size();
    let header_len = |head: &[u8]| -> Result<usize> {
        if head.len() < hsize {
            return Err(IoError::truncated("binary array header"));
        }
        if !layout.compressed {
            return Ok(hsize);
        }
        layout
            .read_size(&head[..hsize])
            .checked_add(3)
            .and_then(|fields| fields.checked_mul(hsize))
            .ok_or_else(|| IoError::parse("compression block count overflows"))
    };

    let (head, body) = match STANDARD.decode(&text) {
        Ok(all) => {
            let len = header_len(&all)?;
            if all.len() < len {
                return Err(IoError::truncated("binary array header"));
            }
            let (head, body) = all.split_at(len);
            (head.to_vec(), body.to_vec())
        }
        Err(_) => {
            let first = decode_prefix(&text, encoded_len(hsize)?)?;
            let chars = encoded_len(header_len(&first)?)?;
            let head = decode_prefix(&text, chars)?;
            let body = STANDARD.decode(&text[chars..])?;
            (head, body)
        }
    };

    if layout.compressed {
        inflate_blocks(&head, &body, layout)
    } else {
        let len = layout.read_size(&head[..hsize]);
        body.get(..len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| IoError::truncated("binary array data"))
    }
}

fn decode_prefix(text: &str, chars: usize) -> Result<Vec<u8>> {
    let prefix = text
        .get(..chars)
        .ok_or_else(|| IoError::truncated("binary array header"))?;
    Ok(STANDARD.decode(prefix)?)
}

/// Inflate zlib blocks described by `[nblocks, block, last, sizes...]`
fn inflate_blocks(head: &[u8], body: &[u8], layout: &Layout) -> Result<Vec<u8>> {
    let hsize = layout.header.size();
    let field = |i: usize| -> Result<usize> {
        head.get(i * hsize..(i + 1) * hsize)
            .map(|b| layout.read_size(b))
            .ok_or_else(|| IoError::truncated("compression header"))
    };
    let blocks = field(0)?;
    let block_size = field(1)?;

    let mut out = Vec::with_capacity(blocks.saturating_mul(block_size).min(body.len() * 8));
    let mut offset: usize = 0;
    for i in 0..blocks {
        let compressed = field(3 + i)?;
        let end = offset
            .checked_add(compressed)
            .ok_or_else(|| IoError::truncated("compressed block"))?;
        let chunk = body
            .get(offset..end)
            .ok_or_else(|| IoError::truncated("compressed block"))?;
        ZlibDecoder::new(chunk).read_to_end(&mut out)?;
        offset = end;
    }
    Ok(out)
}
