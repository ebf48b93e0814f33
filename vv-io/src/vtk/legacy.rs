//! Legacy `# vtk DataFile` PolyData reader
//!
//! Handles ASCII and big-endian BINARY files, the classic `n size` cell
//! layout and the 5.x `OFFSETS`/`CONNECTIVITY` layout. Keyword headers are
//! read a line at a time so binary payloads start exactly after the newline.

use super::{cells_from_offsets, triangulate_polygon, triangulate_strip, Endian, PolyData, ScalarType};
use crate::{IoError, Result};
use vv_core::TriangleMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Binary,
}

/// Which dataset the attribute sections currently belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Dataset,
    Points(usize),
    Cells(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Polygons,
    Strips,
    Ignored,
}

/// Parse a complete legacy file held in memory
pub fn read_poly_data(data: &[u8]) -> Result<TriangleMesh> {
    LegacyReader::new(data)?.read()
}

struct LegacyReader<'a> {
    data: &'a [u8],
    pos: usize,
    encoding: Encoding,
    target: Target,
    poly: PolyData,
}

impl<'a> LegacyReader<'a> {
    fn new(data: &'a [u8]) -> Result<Self> {
        let mut reader = Self {
            data,
            pos: 0,
            encoding: Encoding::Ascii,
            target: Target::Dataset,
            poly: PolyData::default(),
        };

        let version = reader.line();
        if !version.starts_with("# vtk DataFile") {
            return Err(IoError::InvalidFormat {
                format: "legacy VTK (missing '# vtk DataFile' line)".to_string(),
            });
        }
        let title = reader.line();
        log::debug!("Legacy VTK '{}' ({})", title.trim(), version.trim());

        reader.encoding = match reader.line().trim().to_ascii_uppercase().as_str() {
            "ASCII" => Encoding::Ascii,
            "BINARY" => Encoding::Binary,
            other => return Err(IoError::parse(format!("unknown legacy VTK encoding '{}'", other))),
        };
        Ok(reader)
    }

    fn read(mut self) -> Result<TriangleMesh> {
        while let Some(keyword) = self.token() {
            let keyword = keyword.to_ascii_uppercase();
            let args = self.line();
            let args: Vec<&str> = args.split_whitespace().collect();
            match keyword.as_str() {
                "DATASET" => {
                    let kind = args.first().copied().unwrap_or("");
                    if !kind.eq_ignore_ascii_case("POLYDATA") {
                        return Err(IoError::Unsupported(format!("legacy VTK dataset '{}'", kind)));
                    }
                }
                "POINTS" => {
                    let count = parse_count(&args, 0, "POINTS")?;
                    let ty = parse_type(&args, 1)?;
                    let coords = self.values(product(count, 3, "POINTS")?, ty)?;
                    self.poly.set_points(&coords);
                }
                "VERTICES" | "LINES" => self.cells(&args, CellKind::Ignored)?,
                "POLYGONS" => self.cells(&args, CellKind::Polygons)?,
                "TRIANGLE_STRIPS" => self.cells(&args, CellKind::Strips)?,
                "POINT_DATA" => self.target = Target::Points(parse_count(&args, 0, "POINT_DATA")?),
                "CELL_DATA" => self.target = Target::Cells(parse_count(&args, 0, "CELL_DATA")?),
                "SCALARS" => self.scalars(&args)?,
                "COLOR_SCALARS" => self.color_scalars(&args)?,
                "VECTORS" | "NORMALS" => self.fixed_width(&args, 3)?,
                "TENSORS" => self.fixed_width(&args, 9)?,
                "TENSORS6" => self.fixed_width(&args, 6)?,
                "TEXTURE_COORDINATES" => self.texture_coordinates(&args)?,
                "GLOBAL_IDS" | "PEDIGREE_IDS" => self.fixed_width(&args, 1)?,
                "FIELD" => self.field(&args)?,
                "LOOKUP_TABLE" => self.lookup_table(&args)?,
                "METADATA" => self.skip_metadata(),
                other => {
                    return Err(IoError::parse(format!("unexpected legacy VTK keyword '{}'", other)))
                }
            }
        }
        Ok(self.poly.into_mesh())
    }

    fn cells(&mut self, args: &[&str], kind: CellKind) -> Result<()> {
        let first = parse_count(args, 0, "cell count")?;
        let size = parse_count(args, 1, "cell size")?;

        let mut faces = Vec::new();
        if self.peek_token() == Some(b"OFFSETS".as_slice()) {
            // 5.x layout: `first` offsets (cells + 1), then `size` connectivity ids
            self.token();
            let ty = parse_type(&[self.line().trim()], 0)?;
            let offsets = to_ids(&self.values(first, ty)?);
            match self.token() {
                Some(k) if k.eq_ignore_ascii_case("CONNECTIVITY") => {}
                _ => return Err(IoError::parse("OFFSETS without CONNECTIVITY")),
            }
            let ty = parse_type(&[self.line().trim()], 0)?;
            let connectivity = to_ids(&self.values(size, ty)?);
            if kind != CellKind::Ignored {
                for cell in cells_from_offsets(&connectivity, &offsets) {
                    push_cell(kind, cell?, &mut faces);
                }
            }
        } else {
            let ids = to_ids(&self.values(size, ScalarType::I32)?);
            let mut rest = ids.as_slice();
            for _ in 0..first {
                let (&n, tail) = rest
                    .split_first()
                    .ok_or_else(|| IoError::truncated("cell list"))?;
                let n = usize::try_from(n).map_err(|_| IoError::parse("negative cell size"))?;
                if n > tail.len() {
                    return Err(IoError::truncated("cell list"));
                }
                let (cell, tail) = tail.split_at(n);
                push_cell(kind, cell, &mut faces);
                rest = tail;
            }
        }
        self.poly.faces.extend(faces);
        Ok(())
    }

    fn scalars(&mut self, args: &[&str]) -> Result<()> {
        let name = parse_name(args)?;
        let ty = parse_type(args, 1)?;
        let components = match args.get(2) {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| IoError::parse(format!("bad SCALARS component count '{}'", c)))?,
            None => 1,
        };
        if self.peek_token().map(|t| t.eq_ignore_ascii_case(b"LOOKUP_TABLE")) == Some(true) {
            self.token();
            self.line();
        }
        self.attribute(name, components, ty)
    }

    fn color_scalars(&mut self, args: &[&str]) -> Result<()> {
        let name = parse_name(args)?;
        let components = parse_count(args, 1, "COLOR_SCALARS width")?;
        let count = product(self.tuple_count(), components, "COLOR_SCALARS")?;
        let values = match self.encoding {
            Encoding::Ascii => self.values(count, ScalarType::F32)?,
            Encoding::Binary => self
                .values(count, ScalarType::U8)?
                .into_iter()
                .map(|v| v / 255.0)
                .collect(),
        };
        self.store(name, components, &values);
        Ok(())
    }

    fn fixed_width(&mut self, args: &[&str], components: usize) -> Result<()> {
        let name = parse_name(args)?;
        let ty = parse_type(args, 1)?;
        self.attribute(name, components, ty)
    }

    fn texture_coordinates(&mut self, args: &[&str]) -> Result<()> {
        let name = parse_name(args)?;
        let components = parse_count(args, 1, "TEXTURE_COORDINATES dimension")?;
        let ty = parse_type(args, 2)?;
        self.attribute(name, components, ty)
    }

    fn field(&mut self, args: &[&str]) -> Result<()> {
        let arrays = parse_count(args, 1, "FIELD array count")?;
        for _ in 0..arrays {
            let name = self
                .token()
                .map(decode_name)
                .ok_or_else(|| IoError::truncated("FIELD array"))?;
            let line = self.line();
            let fields: Vec<&str> = line.split_whitespace().collect();
            let components = parse_count(&fields, 0, "FIELD components")?;
            let tuples = parse_count(&fields, 1, "FIELD tuples")?;
            let ty = parse_type(&fields, 2)?;
            let values = self.values(product(components, tuples, "FIELD")?, ty)?;
            if self.at_metadata() {
                self.skip_metadata();
            }
            if matches!(self.target, Target::Points(n) if n == tuples) {
                self.store(name, components, &values);
            }
        }
        Ok(())
    }

    fn lookup_table(&mut self, args: &[&str]) -> Result<()> {
        let size = parse_count(args, 1, "LOOKUP_TABLE size")?;
        let ty = match self.encoding {
            Encoding::Ascii => ScalarType::F32,
            Encoding::Binary => ScalarType::U8,
        };
        self.values(product(size, 4, "LOOKUP_TABLE")?, ty)?;
        Ok(())
    }

    fn attribute(&mut self, name: String, components: usize, ty: ScalarType) -> Result<()> {
        let count = product(self.tuple_count(), components, &name)?;
        let values = self.values(count, ty)?;
        self.store(name, components, &values);
        Ok(())
    }

    fn store(&mut self, name: String, components: usize, values: &[f64]) {
        match self.target {
            Target::Points(_) => self.poly.push_array(name, components, values),
            Target::Cells(_) => log::debug!("Skipping cell array '{}'", name),
            Target::Dataset => log::debug!("Skipping dataset field '{}'", name),
        }
    }

    fn tuple_count(&self) -> usize {
        match self.target {
            Target::Points(n) | Target::Cells(n) => n,
            Target::Dataset => 0,
        }
    }

    /// Read `count` values in the file's encoding
    fn values(&mut self, count: usize, ty: ScalarType) -> Result<Vec<f64>> {
        match self.encoding {
            Encoding::Ascii => (0..count)
                .map(|_| {
                    let token = self.token().ok_or_else(|| IoError::truncated("ASCII values"))?;
                    token
                        .parse::<f64>()
                        .map_err(|_| IoError::parse(format!("bad numeric value '{}'", token)))
                })
                .collect(),
            Encoding::Binary => {
                let end = product(count, ty.size(), "binary value")?
                    .checked_add(self.pos)
                    .ok_or_else(|| IoError::truncated("binary values"))?;
                let bytes = self
                    .data
                    .get(self.pos..end)
                    .ok_or_else(|| IoError::truncated("binary values"))?;
                self.pos = end;
                Ok(ty.decode(bytes, Endian::Big))
            }
        }
    }

    fn at_metadata(&self) -> bool {
        self.peek_token().map(|t| t.eq_ignore_ascii_case(b"METADATA")) == Some(true)
    }

    /// Skip a METADATA block, which runs until the next blank line
    fn skip_metadata(&mut self) {
        if self.at_metadata() {
            self.token();
            self.line();
        }
        while self.pos < self.data.len() {
            if self.line().trim().is_empty() {
                break;
            }
        }
    }

    /// Next whitespace-delimited token, or `None` at end of data
    fn token(&mut self) -> Option<&'a str> {
        let (start, end) = self.token_bounds()?;
        self.pos = end;
        std::str::from_utf8(&self.data[start..end]).ok()
    }

    fn peek_token(&self) -> Option<&'a [u8]> {
        self.token_bounds().map(|(s, e)| &self.data[s..e])
    }

    fn token_bounds(&self) -> Option<(usize, usize)> {
        let data = self.data;
        let start = self.pos + data[self.pos..].iter().position(|b| !b.is_ascii_whitespace())?;
        let end = data[start..]
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .map_or(data.len(), |n| start + n);
        Some((start, end))
    }

    /// Rest of the current line, consuming the line terminator
    fn line(&mut self) -> String {
        let rest = &self.data[self.pos..];
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(n) => (&rest[..n], n + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        String::from_utf8_lossy(line).trim_end_matches('\r').to_string()
    }
}

fn push_cell(kind: CellKind, cell: &[i64], faces: &mut Vec<vv_core::Face>) {
    match kind {
        CellKind::Polygons => triangulate_polygon(cell, faces),
        CellKind::Strips => triangulate_strip(cell, faces),
        CellKind::Ignored => {}
    }
}

fn to_ids(values: &[f64]) -> Vec<i64> {
    values.iter().map(|&v| v as i64).collect()
}

fn parse_count(args: &[&str], index: usize, what: &str) -> Result<usize> {
    args.get(index)
        .and_then(|a| a.parse::<usize>().ok())
        .ok_or_else(|| IoError::parse(format!("missing or invalid {}", what)))
}

/// Multiply two counts read from the file, failing instead of wrapping
fn product(a: usize, b: usize, what: &str) -> Result<usize> {
    a.checked_mul(b)
        .ok_or_else(|| IoError::parse(format!("{} size {} x {} overflows", what, a, b)))
}

fn parse_type(args: &[&str], index: usize) -> Result<ScalarType> {
    let name = args.get(index).copied().unwrap_or("");
    ScalarType::from_legacy_name(name)
        .ok_or_else(|| IoError::Unsupported(format!("legacy VTK data type '{}'", name)))
}

fn parse_name(args: &[&str]) -> Result<String> {
    args.first()
        .map(|n| decode_name(n))
        .ok_or_else(|| IoError::parse("attribute without a name"))
}

/// Undo the `%XX` escaping legacy writers apply to names with spaces
pub fn decode_name(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
