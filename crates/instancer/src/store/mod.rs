//! Sparse variation data, organized by region.
//!
//! Everything the interpolator needs is decoded once per font: glyph tuples
//! from `gvar`, advance deltas from `HVAR` and metric deltas from `MVAR`.
//! Regions from all three tables are interned into one list so that a region
//! scalar is computed once per location, no matter how many tuples use it.
//!
//! Integrity problems do not abort loading. They are kept as [`Defect`]s next
//! to the data they belong to and only surface when a build touches that
//! data at a location where it matters.

mod gvar;
mod item;

use std::collections::BTreeMap;

use indexmap::IndexSet;
use log::debug;
use read_fonts::{FontData, types::Tag};

use crate::{
    container::FontContainer,
    error::{FormatError, InterpolationError, Result},
    registry::Axis,
};

pub use gvar::{GlyphShape, PHANTOM_POINTS};

/// One axis of a region: start, peak and end, all normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionAxis {
    pub start: f64,
    pub peak: f64,
    pub end: f64,
}

impl RegionAxis {
    pub fn new(start: f64, peak: f64, end: f64) -> Self {
        Self { start, peak, end }
    }

    /// A peak with no explicit intermediate region spans from zero to the
    /// peak.
    pub fn implied(peak: f64) -> Self {
        Self { start: peak.min(0.0), peak, end: peak.max(0.0) }
    }

    /// `start <= peak <= end`, and a constraining axis may not cross zero.
    fn is_well_formed(&self) -> bool {
        if self.peak == 0.0 {
            return true;
        }
        self.start <= self.peak
            && self.peak <= self.end
            && !(self.start < 0.0 && self.end > 0.0)
    }
}

/// The part of the design space where a tuple applies.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub axes: Vec<RegionAxis>,
}

impl Region {
    pub fn new(axes: Vec<RegionAxis>) -> Self {
        Self { axes }
    }

    /// Index of the first axis that is not well formed.
    pub fn malformed_axis(&self) -> Option<usize> {
        self.axes.iter().position(|a| !a.is_well_formed())
    }

    fn key(&self) -> RegionKey {
        RegionKey(
            self.axes
                .iter()
                .map(|a| [f2dot14_bits(a.start), f2dot14_bits(a.peak), f2dot14_bits(a.end)])
                .collect(),
        )
    }
}

/// Regions compare by their F2Dot14 encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegionKey(Vec<[i32; 3]>);

fn f2dot14_bits(value: f64) -> i32 {
    (value * 16384.0).round() as i32
}

/// Interned regions shared by every table of a font.
#[derive(Debug, Clone, Default)]
pub struct RegionList {
    keys: IndexSet<RegionKey>,
    regions: Vec<Region>,
}

impl RegionList {
    /// Index of `region`, adding it if it is new.
    pub fn intern(&mut self, region: Region) -> usize {
        let (index, inserted) = self.keys.insert_full(region.key());
        if inserted {
            self.regions.push(region);
        }
        index
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }
}

/// A point delta in font units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointDelta {
    pub x: i32,
    pub y: i32,
}

impl PointDelta {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Deltas of one glyph tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum TupleDeltas {
    /// One delta for every point, phantom points included.
    Dense(Vec<PointDelta>),
    /// Deltas for explicitly numbered points; the rest are inferred.
    Sparse(Vec<(usize, PointDelta)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphTuple {
    pub region: usize,
    pub deltas: TupleDeltas,
}

/// Variation data that failed to decode. `region` is `None` when the data
/// could not be tied to a region at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Defect {
    pub region: Option<usize>,
    pub error: InterpolationError,
}

/// All variation data of one glyph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphVariation {
    /// Points addressed by the tuples, phantom points included.
    pub points: usize,
    pub tuples: Vec<GlyphTuple>,
    pub defects: Vec<Defect>,
    /// Base outline, kept only for glyphs that need untouched points
    /// inferred.
    pub shape: Option<GlyphShape>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarTuple {
    pub region: usize,
    pub delta: i32,
}

/// Variation data of a single scalar value such as an advance width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarVariation {
    pub tuples: Vec<ScalarTuple>,
    pub defects: Vec<Defect>,
}

/// Decoded variation data of one font.
#[derive(Debug, Clone, Default)]
pub struct VariationStore {
    axis_count: usize,
    regions: RegionList,
    glyphs: Vec<GlyphVariation>,
    advances: Option<Vec<ScalarVariation>>,
    metrics: BTreeMap<Tag, ScalarVariation>,
    global_defects: Vec<Defect>,
}

impl VariationStore {
    /// Decode `gvar`, `HVAR` and `MVAR`.
    ///
    /// # Errors
    ///
    /// Only unreadable table headers are errors. Anything wrong below the
    /// header is recorded as a defect.
    pub fn load(font: &FontContainer, axes: &[Axis]) -> Result<Self> {
        let axis_count = axes.len();
        let mut store = VariationStore { axis_count, ..Default::default() };

        let outlines = gvar::GlyphOutlines::load(font)?;
        let num_glyphs = outlines.num_glyphs();

        match font.table(gvar::GVAR) {
            Some(data) => {
                let decoded = gvar::decode(data, axis_count, &outlines, &mut store.regions)?;
                store.glyphs = decoded.glyphs;
                store.global_defects.extend(decoded.defects);
            }
            None => store.glyphs = vec![GlyphVariation::default(); num_glyphs],
        }

        if let Some(data) = font.table(item::HVAR) {
            let decoded = item::decode_hvar(data, axis_count, num_glyphs, &mut store.regions)?;
            store.global_defects.extend(decoded.defects);
            store.advances = Some(decoded.values);
        }

        if let Some(data) = font.table(item::MVAR) {
            let decoded = item::decode_mvar(data, axis_count, &mut store.regions)?;
            store.global_defects.extend(decoded.defects);
            store.metrics = decoded.values;
        }

        debug!(
            "variation store: {} regions, {} glyphs, {} metrics, {} defects",
            store.regions.len(),
            store.glyphs.len(),
            store.metrics.len(),
            store.defect_count()
        );
        Ok(store)
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    pub fn regions(&self) -> &RegionList {
        &self.regions
    }

    pub fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyph(&self, gid: u32) -> Option<&GlyphVariation> {
        self.glyphs.get(gid as usize)
    }

    /// Advance width variations, when the font has `HVAR`.
    pub fn advances(&self) -> Option<&[ScalarVariation]> {
        self.advances.as_deref()
    }

    pub fn has_advances(&self) -> bool {
        self.advances.is_some()
    }

    pub fn metric(&self, tag: Tag) -> Option<&ScalarVariation> {
        self.metrics.get(&tag)
    }

    pub fn metric_tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.metrics.keys().copied()
    }

    /// Defects that affect every quantity.
    pub fn global_defects(&self) -> &[Defect] {
        &self.global_defects
    }

    pub fn defect_count(&self) -> usize {
        self.global_defects.len()
            + self.glyphs.iter().map(|g| g.defects.len()).sum::<usize>()
            + self
                .advances
                .iter()
                .flatten()
                .map(|a| a.defects.len())
                .sum::<usize>()
            + self.metrics.values().map(|m| m.defects.len()).sum::<usize>()
    }
}

/// Big-endian reads from a variation table header. Running off the end is a
/// format error.
#[derive(Clone, Copy)]
pub(crate) struct Header<'a> {
    bytes: &'a [u8],
    data: FontData<'a>,
    tag: Tag,
}

impl<'a> Header<'a> {
    pub(crate) fn new(data: &'a [u8], tag: Tag) -> Self {
        Self { bytes: data, data: FontData::new(data), tag }
    }

    fn truncated(&self) -> FormatError {
        FormatError::Malformed { tag: self.tag, reason: "header is truncated" }
    }

    pub(crate) fn u16(&self, offset: usize) -> std::result::Result<u16, FormatError> {
        self.data.read_at::<u16>(offset).map_err(|_| self.truncated())
    }

    pub(crate) fn u32(&self, offset: usize) -> std::result::Result<u32, FormatError> {
        self.data.read_at::<u32>(offset).map_err(|_| self.truncated())
    }

    pub(crate) fn data(&self) -> FontData<'a> {
        self.data
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}
