//! Glyph variations (`gvar`).

use log::debug;
use read_fonts::{
    TableProvider,
    tables::glyf::Glyph,
    types::{GlyphId, Tag},
};

use super::{
    Defect, GlyphTuple, GlyphVariation, Header, PointDelta, Region, RegionAxis, RegionList,
    TupleDeltas,
};
use crate::{
    container::FontContainer,
    error::{FormatError, InterpolationError, Result},
};

pub(crate) const GVAR: Tag = Tag::new(b"gvar");
const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");

/// Left origin, advance, top origin and bottom origin.
pub const PHANTOM_POINTS: usize = 4;

const SHARED_POINT_NUMBERS: u16 = 0x8000;
const COUNT_MASK: u16 = 0x0FFF;

const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
const INTERMEDIATE_REGION: u16 = 0x4000;
const PRIVATE_POINT_NUMBERS: u16 = 0x2000;
const TUPLE_INDEX_MASK: u16 = 0x0FFF;

const LONG_OFFSETS: u16 = 0x0001;

/// Outline of a simple glyph, as needed to infer untouched points.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphShape {
    pub coords: Vec<(i16, i16)>,
    /// Index of the last point of every contour.
    pub contour_ends: Vec<usize>,
}

struct OutlineInfo {
    /// Points addressed by variation data, phantom points excluded. For
    /// composite glyphs this is the number of components.
    points: usize,
    shape: Option<GlyphShape>,
}

/// Point counts of every glyph, read once from `glyf`.
pub(super) struct GlyphOutlines {
    glyphs: Vec<OutlineInfo>,
}

impl GlyphOutlines {
    pub(super) fn load(font: &FontContainer) -> Result<Self> {
        if !font.contains(GLYF) || !font.contains(LOCA) {
            return Err(FormatError::UnsupportedOutlines.into());
        }
        let num_glyphs = font.maxp()?.num_glyphs();
        let glyf = font.glyf()?;
        let loca = font.loca(None)?;

        let mut glyphs = Vec::with_capacity(usize::from(num_glyphs));
        for gid in 0..u32::from(num_glyphs) {
            let info = match loca.get_glyf(GlyphId::new(gid), &glyf)? {
                None => OutlineInfo { points: 0, shape: None },
                Some(Glyph::Simple(simple)) => {
                    let coords: Vec<(i16, i16)> = simple.points().map(|p| (p.x, p.y)).collect();
                    let contour_ends = simple
                        .end_pts_of_contours()
                        .iter()
                        .map(|end| usize::from(end.get()))
                        .collect();
                    OutlineInfo { points: coords.len(), shape: Some(GlyphShape { coords, contour_ends }) }
                }
                Some(Glyph::Composite(composite)) => {
                    OutlineInfo { points: composite.components().count(), shape: None }
                }
            };
            glyphs.push(info);
        }
        Ok(Self { glyphs })
    }

    pub(super) fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    /// Points addressed by variation data, phantom points included.
    fn point_count(&self, gid: usize) -> usize {
        self.glyphs.get(gid).map_or(0, |g| g.points) + PHANTOM_POINTS
    }
}

pub(super) struct DecodedGlyphs {
    pub glyphs: Vec<GlyphVariation>,
    pub defects: Vec<Defect>,
}

/// Decode every glyph's tuples.
///
/// Only a truncated header is an error. A `gvar` whose axis count differs
/// from `fvar` is kept as a single store-wide defect and contributes no
/// tuples.
pub(super) fn decode(
    data: &[u8],
    axis_count: usize,
    outlines: &GlyphOutlines,
    regions: &mut RegionList,
) -> Result<DecodedGlyphs> {
    let header = Header::new(data, GVAR);
    let num_glyphs = outlines.num_glyphs();
    let mut decoded = DecodedGlyphs {
        glyphs: vec![GlyphVariation::default(); num_glyphs],
        defects: Vec::new(),
    };

    let table_axes = usize::from(header.u16(4)?);
    let shared_count = usize::from(header.u16(6)?);
    let shared_offset = header.u32(8)? as usize;
    let glyph_count = usize::from(header.u16(12)?);
    let flags = header.u16(14)?;
    let data_offset = header.u32(16)? as usize;

    if table_axes != axis_count {
        decoded.defects.push(Defect {
            region: None,
            error: InterpolationError::AxisCountMismatch {
                table: GVAR,
                expected: axis_count,
                actual: table_axes,
            },
        });
        return Ok(decoded);
    }
    if glyph_count != num_glyphs {
        debug!("gvar covers {glyph_count} glyphs, font has {num_glyphs}");
    }

    let mut offsets = Vec::with_capacity(glyph_count + 1);
    for i in 0..=glyph_count {
        let offset = if flags & LONG_OFFSETS != 0 {
            header.u32(20 + i * 4)? as usize
        } else {
            usize::from(header.u16(20 + i * 2)?) * 2
        };
        offsets.push(data_offset + offset);
    }

    let mut shared_tuples = Vec::with_capacity(shared_count);
    for i in 0..shared_count {
        let mut peaks = Vec::with_capacity(axis_count);
        for axis in 0..axis_count {
            let raw = header
                .data()
                .read_at::<i16>(shared_offset + (i * axis_count + axis) * 2)
                .map_err(|_| FormatError::Malformed { tag: GVAR, reason: "shared tuples are truncated" })?;
            peaks.push(f2dot14(raw));
        }
        shared_tuples.push(peaks);
    }

    let context = TupleContext { axis_count, shared_tuples: &shared_tuples };
    for (gid, slot) in decoded.glyphs.iter_mut().enumerate().take(glyph_count) {
        let (start, end) = (offsets[gid], offsets[gid + 1]);
        if start == end {
            continue;
        }
        let point_count = outlines.point_count(gid);
        let Some(glyph_data) = data.get(start..end) else {
            slot.defects.push(Defect {
                region: None,
                error: malformed(gid, "glyph variation data out of bounds"),
            });
            continue;
        };
        *slot = decode_glyph(glyph_data, gid as u32, point_count, &context, regions);
        let needs_shape = slot
            .tuples
            .iter()
            .any(|t| matches!(t.deltas, TupleDeltas::Sparse(_)));
        if needs_shape {
            slot.shape = outlines.glyphs[gid].shape.clone();
        }
    }
    Ok(decoded)
}

struct TupleContext<'a> {
    axis_count: usize,
    shared_tuples: &'a [Vec<f64>],
}

fn f2dot14(raw: i16) -> f64 {
    f64::from(raw) / 16384.0
}

fn malformed(gid: usize, what: &str) -> InterpolationError {
    InterpolationError::MalformedDeltas { table: GVAR, target: format!("glyph {gid}: {what}") }
}

fn decode_glyph(
    data: &[u8],
    gid: u32,
    point_count: usize,
    context: &TupleContext,
    regions: &mut RegionList,
) -> GlyphVariation {
    let mut variation = GlyphVariation { points: point_count, ..Default::default() };
    let broken = |what: &str| Defect { region: None, error: malformed(gid as usize, what) };

    let mut headers = Reader::new(data);
    let (Some(tuple_count), Some(data_offset)) = (headers.u16(), headers.u16()) else {
        variation.defects.push(broken("truncated glyph header"));
        return variation;
    };
    let Some(serialized) = data.get(usize::from(data_offset)..) else {
        variation.defects.push(broken("tuple data out of bounds"));
        return variation;
    };
    let mut body = Reader::new(serialized);

    let shared_points = if tuple_count & SHARED_POINT_NUMBERS != 0 {
        match decode_points(&mut body) {
            Some(points) => points,
            None => {
                variation.defects.push(broken("malformed shared point numbers"));
                return variation;
            }
        }
    } else {
        None
    };

    for _ in 0..tuple_count & COUNT_MASK {
        let (Some(size), Some(index)) = (headers.u16(), headers.u16()) else {
            variation.defects.push(broken("truncated tuple header"));
            break;
        };

        let peaks = if index & EMBEDDED_PEAK_TUPLE != 0 {
            match headers.f2dot14s(context.axis_count) {
                Some(peaks) => peaks,
                None => {
                    variation.defects.push(broken("truncated tuple header"));
                    break;
                }
            }
        } else {
            let shared = usize::from(index & TUPLE_INDEX_MASK);
            match context.shared_tuples.get(shared) {
                Some(peaks) => peaks.clone(),
                None => {
                    variation.defects.push(Defect {
                        region: None,
                        error: InterpolationError::RegionOutOfRange {
                            table: GVAR,
                            index: shared,
                            count: context.shared_tuples.len(),
                        },
                    });
                    body.skip(usize::from(size));
                    if index & INTERMEDIATE_REGION != 0
                        && headers.f2dot14s(context.axis_count * 2).is_none()
                    {
                        break;
                    }
                    continue;
                }
            }
        };

        let axes = if index & INTERMEDIATE_REGION != 0 {
            let (Some(starts), Some(ends)) = (
                headers.f2dot14s(context.axis_count),
                headers.f2dot14s(context.axis_count),
            ) else {
                variation.defects.push(broken("truncated tuple header"));
                break;
            };
            peaks
                .iter()
                .zip(starts.iter().zip(&ends))
                .map(|(peak, (start, end))| RegionAxis::new(*start, *peak, *end))
                .collect()
        } else {
            peaks.iter().map(|peak| RegionAxis::implied(*peak)).collect()
        };

        let region = Region::new(axes);
        let malformed_axis = region.malformed_axis();
        let region = regions.intern(region);
        let Some(tuple_data) = body.take(usize::from(size)) else {
            variation.defects.push(Defect {
                region: Some(region),
                error: malformed(gid as usize, "tuple data out of bounds"),
            });
            break;
        };
        if let Some(axis) = malformed_axis {
            variation.defects.push(Defect {
                region: Some(region),
                error: InterpolationError::MalformedRegion { table: GVAR, axis },
            });
            continue;
        }

        let points = if index & PRIVATE_POINT_NUMBERS != 0 {
            let mut reader = Reader::new(tuple_data);
            match decode_points(&mut reader) {
                Some(points) => (points, reader.rest()),
                None => {
                    variation.defects.push(Defect {
                        region: Some(region),
                        error: malformed(gid as usize, "malformed point numbers"),
                    });
                    continue;
                }
            }
        } else {
            (shared_points.clone(), tuple_data)
        };

        match tuple_deltas(gid, point_count, points) {
            Ok(deltas) => variation.tuples.push(GlyphTuple { region, deltas }),
            Err(error) => variation.defects.push(Defect { region: Some(region), error }),
        }
    }
    variation
}

fn tuple_deltas(
    gid: u32,
    point_count: usize,
    (points, data): (Option<Vec<u16>>, &[u8]),
) -> std::result::Result<TupleDeltas, InterpolationError> {
    let values = decode_deltas(&mut Reader::new(data))
        .ok_or_else(|| malformed(gid as usize, "malformed packed deltas"))?;

    match points {
        None => {
            if values.len() != point_count * 2 {
                return Err(InterpolationError::PointCountMismatch {
                    glyph: gid,
                    expected: point_count,
                    actual: values.len() / 2,
                });
            }
            let (xs, ys) = values.split_at(point_count);
            Ok(TupleDeltas::Dense(
                xs.iter().zip(ys).map(|(x, y)| PointDelta::new(*x, *y)).collect(),
            ))
        }
        Some(points) => {
            if values.len() != points.len() * 2 {
                return Err(malformed(gid as usize, "delta count differs from point count"));
            }
            if let Some(max) = points.iter().copied().max()
                && usize::from(max) >= point_count
            {
                return Err(InterpolationError::PointCountMismatch {
                    glyph: gid,
                    expected: point_count,
                    actual: usize::from(max) + 1,
                });
            }
            let (xs, ys) = values.split_at(points.len());
            Ok(TupleDeltas::Sparse(
                points
                    .iter()
                    .zip(xs.iter().zip(ys))
                    .map(|(point, (x, y))| (usize::from(*point), PointDelta::new(*x, *y)))
                    .collect(),
            ))
        }
    }
}

/// Packed point numbers. `None` inside the `Some` means "all points".
fn decode_points(reader: &mut Reader) -> Option<Option<Vec<u16>>> {
    let first = reader.u8()?;
    if first == 0 {
        return Some(None);
    }
    let count = if first & 0x80 != 0 {
        (usize::from(first & 0x7F) << 8) | usize::from(reader.u8()?)
    } else {
        usize::from(first)
    };

    let mut points = Vec::with_capacity(count);
    let mut last = 0u16;
    while points.len() < count {
        let control = reader.u8()?;
        let run = usize::from(control & 0x7F) + 1;
        if points.len() + run > count {
            return None;
        }
        for _ in 0..run {
            let step = if control & 0x80 != 0 { reader.u16()? } else { u16::from(reader.u8()?) };
            last = last.wrapping_add(step);
            points.push(last);
        }
    }
    Some(Some(points))
}

const DELTAS_ARE_ZERO: u8 = 0x80;
const DELTAS_ARE_WORDS: u8 = 0x40;
const DELTAS_ARE_LONG: u8 = 0xC0;
const DELTA_RUN_COUNT_MASK: u8 = 0x3F;

/// Every packed delta up to the end of `reader`.
fn decode_deltas(reader: &mut Reader) -> Option<Vec<i32>> {
    let mut deltas = Vec::new();
    while !reader.is_empty() {
        let control = reader.u8()?;
        let run = usize::from(control & DELTA_RUN_COUNT_MASK) + 1;
        match control & DELTAS_ARE_LONG {
            DELTAS_ARE_ZERO => deltas.extend(std::iter::repeat_n(0, run)),
            DELTAS_ARE_LONG => {
                for _ in 0..run {
                    deltas.push(reader.i32()?);
                }
            }
            DELTAS_ARE_WORDS => {
                for _ in 0..run {
                    deltas.push(i32::from(reader.u16()? as i16));
                }
            }
            _ => {
                for _ in 0..run {
                    deltas.push(i32::from(reader.u8()? as i8));
                }
            }
        }
    }
    Some(deltas)
}

/// Forward-only reads over packed tuple data.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(len)?)?;
        self.pos += len;
        Some(bytes)
    }

    fn skip(&mut self, len: usize) {
        self.pos = self.pos.saturating_add(len);
    }

    fn rest(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn i32(&mut self) -> Option<i32> {
        self.take(4).map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f2dot14s(&mut self, count: usize) -> Option<Vec<f64>> {
        (0..count).map(|_| self.u16().map(|raw| f2dot14(raw as i16))).collect()
    }
}
