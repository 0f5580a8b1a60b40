//! Item variation stores of `HVAR` and `MVAR`.

use std::collections::BTreeMap;

use read_fonts::types::Tag;

use super::{Defect, Header, Region, RegionAxis, RegionList, ScalarTuple, ScalarVariation};
use crate::error::{FormatError, InterpolationError, Result};

pub(crate) const HVAR: Tag = Tag::new(b"HVAR");
pub(crate) const MVAR: Tag = Tag::new(b"MVAR");

const LONG_WORDS: u16 = 0x8000;
const WORD_COUNT_MASK: u16 = 0x7FFF;

/// Outer and inner index of a value that does not vary.
const NO_VARIATION_INDEX: (u32, u32) = (0xFFFF, 0xFFFF);

const INNER_INDEX_BIT_COUNT_MASK: u8 = 0x0F;
const MAP_ENTRY_SIZE_MASK: u8 = 0x30;

pub(super) struct Decoded<T> {
    pub values: T,
    /// Problems that affect the whole table.
    pub defects: Vec<Defect>,
}

/// Advance width variations, one entry per glyph.
pub(super) fn decode_hvar(
    data: &[u8],
    axis_count: usize,
    num_glyphs: usize,
    regions: &mut RegionList,
) -> Result<Decoded<Vec<ScalarVariation>>> {
    let header = Header::new(data, HVAR);
    let store_offset = header.u32(4)? as usize;
    let map_offset = header.u32(8)? as usize;
    if store_offset == 0 {
        return Err(FormatError::Malformed { tag: HVAR, reason: "no item variation store" }.into());
    }

    let store = ItemStore::decode(data, store_offset, HVAR, axis_count, regions)?;
    let map = match map_offset {
        0 => None,
        offset => Some(DeltaSetIndexMap::decode(data, offset, HVAR)?),
    };

    let values = (0..num_glyphs)
        .map(|gid| {
            let (outer, inner) = match &map {
                Some(map) => map.get(gid),
                // Without a mapping the glyph id is the inner index.
                None => (0, gid as u32),
            };
            store.variation(outer, inner)
        })
        .collect();
    Ok(Decoded { values, defects: store.defects })
}

/// Metric variations keyed by their `MVAR` value tag.
pub(super) fn decode_mvar(
    data: &[u8],
    axis_count: usize,
    regions: &mut RegionList,
) -> Result<Decoded<BTreeMap<Tag, ScalarVariation>>> {
    let header = Header::new(data, MVAR);
    let record_size = usize::from(header.u16(6)?);
    let record_count = usize::from(header.u16(8)?);
    let store_offset = usize::from(header.u16(10)?);

    if record_count == 0 {
        return Ok(Decoded { values: BTreeMap::new(), defects: Vec::new() });
    }
    if store_offset == 0 {
        return Err(FormatError::Malformed { tag: MVAR, reason: "no item variation store" }.into());
    }
    if record_size < 8 {
        return Err(FormatError::Malformed { tag: MVAR, reason: "value records are too small" }.into());
    }

    let store = ItemStore::decode(data, store_offset, MVAR, axis_count, regions)?;
    let mut values = BTreeMap::new();
    for i in 0..record_count {
        let base = 12 + i * record_size;
        let tag = Tag::from_u32(header.u32(base)?);
        let outer = header.u16(base + 4)?;
        let inner = header.u16(base + 6)?;
        values.insert(tag, store.variation(u32::from(outer), u32::from(inner)));
    }
    Ok(Decoded { values, defects: store.defects })
}

/// Maps glyph ids to delta-set indices.
struct DeltaSetIndexMap {
    entries: Vec<(u32, u32)>,
}

impl DeltaSetIndexMap {
    fn decode(data: &[u8], offset: usize, tag: Tag) -> Result<Self> {
        let map = Header::new(data.get(offset..).unwrap_or_default(), tag);
        let format = map.u16(0)? >> 8;
        let entry_format = (map.u16(0)? & 0xFF) as u8;
        let (count, start) = match format {
            0 => (map.u16(2)? as usize, 4),
            1 => (map.u32(2)? as usize, 6),
            _ => {
                return Err(FormatError::Malformed { tag, reason: "unknown delta-set index map format" }.into());
            }
        };
        let entry_size = usize::from((entry_format & MAP_ENTRY_SIZE_MASK) >> 4) + 1;
        let inner_bits = u32::from(entry_format & INNER_INDEX_BIT_COUNT_MASK) + 1;

        let raw = map
            .bytes()
            .get(start..start + count * entry_size)
            .ok_or(FormatError::Malformed { tag, reason: "delta-set index map is truncated" })?;
        let entries = raw
            .chunks_exact(entry_size)
            .map(|bytes| {
                let value = bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                (value >> inner_bits, value & ((1 << inner_bits) - 1))
            })
            .collect();
        Ok(Self { entries })
    }

    /// Glyphs past the end of the map use its last entry.
    fn get(&self, gid: usize) -> (u32, u32) {
        match self.entries.get(gid).or(self.entries.last()) {
            Some(entry) => *entry,
            None => (0, gid as u32),
        }
    }
}

enum Column {
    Region(usize),
    Broken(Defect),
}

struct DeltaSubtable {
    columns: Vec<Column>,
    rows: Vec<Vec<i32>>,
}

struct ItemStore {
    tag: Tag,
    subtables: Vec<std::result::Result<DeltaSubtable, InterpolationError>>,
    defects: Vec<Defect>,
}

impl ItemStore {
    fn decode(
        data: &[u8],
        offset: usize,
        tag: Tag,
        axis_count: usize,
        regions: &mut RegionList,
    ) -> Result<Self> {
        let base = data.get(offset..).unwrap_or_default();
        let header = Header::new(base, tag);
        let region_list_offset = header.u32(2)? as usize;
        let subtable_count = usize::from(header.u16(6)?);

        let mut store = ItemStore { tag, subtables: Vec::new(), defects: Vec::new() };

        let region_list = Header::new(base.get(region_list_offset..).unwrap_or_default(), tag);
        let list_axes = usize::from(region_list.u16(0)?);
        let region_count = usize::from(region_list.u16(2)?);
        if list_axes != axis_count {
            store.defects.push(Defect {
                region: None,
                error: InterpolationError::AxisCountMismatch {
                    table: tag,
                    expected: axis_count,
                    actual: list_axes,
                },
            });
            return Ok(store);
        }

        // Local region index to interned index plus its first bad axis.
        let mut local_regions = Vec::with_capacity(region_count);
        for r in 0..region_count {
            let mut axes = Vec::with_capacity(axis_count);
            for a in 0..axis_count {
                let at = 4 + (r * axis_count + a) * 6;
                let start = f2dot14(region_list.u16(at)?);
                let peak = f2dot14(region_list.u16(at + 2)?);
                let end = f2dot14(region_list.u16(at + 4)?);
                axes.push(RegionAxis::new(start, peak, end));
            }
            let region = Region::new(axes);
            let malformed = region.malformed_axis();
            local_regions.push((regions.intern(region), malformed));
        }

        for i in 0..subtable_count {
            let subtable_offset = header.u32(8 + i * 4)? as usize;
            let subtable = if subtable_offset == 0 {
                Err(InterpolationError::MalformedDeltas {
                    table: tag,
                    target: format!("item variation data {i}: null offset"),
                })
            } else {
                decode_subtable(base.get(subtable_offset..).unwrap_or_default(), tag, &local_regions)
                    .ok_or_else(|| InterpolationError::MalformedDeltas {
                        table: tag,
                        target: format!("item variation data {i}"),
                    })
            };
            store.subtables.push(subtable);
        }
        Ok(store)
    }

    fn variation(&self, outer: u32, inner: u32) -> ScalarVariation {
        let mut variation = ScalarVariation::default();
        if (outer, inner) == NO_VARIATION_INDEX {
            return variation;
        }
        let out_of_range = || Defect {
            region: None,
            error: InterpolationError::DeltaSetOutOfRange {
                table: self.tag,
                outer: outer as u16,
                inner: inner as u16,
            },
        };

        let subtable = match self.subtables.get(outer as usize) {
            Some(Ok(subtable)) => subtable,
            Some(Err(error)) => {
                variation.defects.push(Defect { region: None, error: error.clone() });
                return variation;
            }
            None => {
                variation.defects.push(out_of_range());
                return variation;
            }
        };
        let Some(row) = subtable.rows.get(inner as usize) else {
            variation.defects.push(out_of_range());
            return variation;
        };

        for (column, delta) in subtable.columns.iter().zip(row) {
            if *delta == 0 {
                continue;
            }
            match column {
                Column::Region(region) => {
                    variation.tuples.push(ScalarTuple { region: *region, delta: *delta })
                }
                Column::Broken(defect) => variation.defects.push(defect.clone()),
            }
        }
        variation
    }
}

fn f2dot14(raw: u16) -> f64 {
    f64::from(raw as i16) / 16384.0
}

fn decode_subtable(
    data: &[u8],
    tag: Tag,
    local_regions: &[(usize, Option<usize>)],
) -> Option<DeltaSubtable> {
    let header = Header::new(data, tag);
    let item_count = usize::from(header.u16(0).ok()?);
    let word_delta_count = header.u16(2).ok()?;
    let region_index_count = usize::from(header.u16(4).ok()?);

    let long_words = word_delta_count & LONG_WORDS != 0;
    let word_count = usize::from(word_delta_count & WORD_COUNT_MASK);
    if word_count > region_index_count {
        return None;
    }

    let mut columns = Vec::with_capacity(region_index_count);
    for i in 0..region_index_count {
        let index = usize::from(header.u16(6 + i * 2).ok()?);
        let column = match local_regions.get(index) {
            Some((region, None)) => Column::Region(*region),
            Some((region, Some(axis))) => Column::Broken(Defect {
                region: Some(*region),
                error: InterpolationError::MalformedRegion { table: tag, axis: *axis },
            }),
            None => Column::Broken(Defect {
                region: None,
                error: InterpolationError::RegionOutOfRange {
                    table: tag,
                    index,
                    count: local_regions.len(),
                },
            }),
        };
        columns.push(column);
    }

    let (word_size, short_size) = if long_words { (4, 2) } else { (2, 1) };
    let row_size = word_count * word_size + (region_index_count - word_count) * short_size;
    let start = 6 + region_index_count * 2;
    let raw = data.get(start..start + item_count * row_size)?;

    let rows = raw
        .chunks_exact(row_size.max(1))
        .take(item_count)
        .map(|row| {
            let (words, shorts) = row.split_at(word_count * word_size);
            let mut deltas = Vec::with_capacity(region_index_count);
            if long_words {
                deltas.extend(
                    words.chunks_exact(4).map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
                );
                deltas.extend(
                    shorts.chunks_exact(2).map(|b| i32::from(i16::from_be_bytes([b[0], b[1]]))),
                );
            } else {
                deltas.extend(
                    words.chunks_exact(2).map(|b| i32::from(i16::from_be_bytes([b[0], b[1]]))),
                );
                deltas.extend(shorts.iter().map(|b| i32::from(*b as i8)));
            }
            deltas
        })
        .collect::<Vec<_>>();
    // A subtable without regions still has one (empty) row per item.
    let rows = if row_size == 0 { vec![Vec::new(); item_count] } else { rows };
    Some(DeltaSubtable { columns, rows })
}
