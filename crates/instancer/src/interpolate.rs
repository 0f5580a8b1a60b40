//! Evaluating variation data at a normalized coordinate.

use kurbo::Vec2;
use read_fonts::types::Tag;

use crate::{
    error::Result,
    iup,
    location::NormalizedCoordinate,
    store::{
        Defect, GlyphVariation, PHANTOM_POINTS, PointDelta, Region, ScalarVariation,
        TupleDeltas, VariationStore,
    },
};

/// How much a region contributes along one axis.
pub fn support(value: f64, start: f64, peak: f64, end: f64) -> f64 {
    if peak == 0.0 || value == peak {
        return 1.0;
    }
    if value < start.min(peak) || value > peak.max(end) {
        return 0.0;
    }
    if value < peak {
        (value - start) / (peak - start)
    } else {
        (end - value) / (end - peak)
    }
}

/// Product of the per-axis supports.
pub fn region_scalar(region: &Region, coord: &[f64]) -> f64 {
    let mut scalar = 1.0;
    for (axis, value) in region.axes.iter().zip(coord) {
        scalar *= support(*value, axis.start, axis.peak, axis.end);
        if scalar == 0.0 {
            break;
        }
    }
    scalar
}

/// OpenType rounding: halves go towards positive infinity.
pub fn ot_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Something whose value varies across the design space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// A point of a glyph outline, phantom points included.
    OutlinePoint { glyph: u32, point: usize },
    AdvanceWidth(u32),
    /// An `MVAR` value tag such as `xhgt`.
    Metric(Tag),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    Point(Vec2),
    Scalar(f64),
}

/// Region scalars for one location, ready to evaluate any quantity.
pub struct Interpolator<'a> {
    store: &'a VariationStore,
    scalars: Vec<f64>,
    at_default: bool,
}

impl<'a> Interpolator<'a> {
    pub fn new(store: &'a VariationStore, coord: &NormalizedCoordinate) -> Self {
        let scalars = store
            .regions()
            .iter()
            .map(|region| region_scalar(region, coord.values()))
            .collect();
        Self { store, scalars, at_default: coord.is_origin() }
    }

    pub fn scalar(&self, region: usize) -> f64 {
        self.scalars.get(region).copied().unwrap_or(0.0)
    }

    /// A defect matters when its region contributes at this location. A
    /// defect that cannot be tied to a region matters everywhere except at
    /// the default location.
    fn check(&self, defects: &[Defect]) -> Result<()> {
        let active = defects.iter().find(|defect| match defect.region {
            Some(region) => self.scalar(region) != 0.0,
            None => !self.at_default,
        });
        match active {
            Some(defect) => Err(defect.error.clone().into()),
            None => Ok(()),
        }
    }

    /// Unrounded deltas for every point of a glyph, phantom points last.
    ///
    /// `None` when nothing varies the glyph at this location.
    pub fn glyph_deltas(&self, glyph: u32) -> Result<Option<Vec<Vec2>>> {
        self.check(self.store.global_defects())?;
        let Some(variation) = self.store.glyph(glyph) else {
            return Ok(None);
        };
        self.check(&variation.defects)?;

        let mut active = variation
            .tuples
            .iter()
            .map(|tuple| (tuple, self.scalar(tuple.region)))
            .filter(|(_, scalar)| *scalar != 0.0)
            .peekable();
        if active.peek().is_none() {
            return Ok(None);
        }

        let mut deltas = vec![Vec2::ZERO; variation.points];
        for (tuple, scalar) in active {
            match &tuple.deltas {
                TupleDeltas::Dense(points) => {
                    for (out, delta) in deltas.iter_mut().zip(points) {
                        *out += Vec2::new(f64::from(delta.x), f64::from(delta.y)) * scalar;
                    }
                }
                TupleDeltas::Sparse(points) => {
                    for (out, delta) in deltas.iter_mut().zip(sparse_deltas(variation, points)) {
                        *out += delta * scalar;
                    }
                }
            }
        }
        Ok(Some(deltas))
    }

    /// Advance width delta from `HVAR`, or `None` when the font has none.
    pub fn advance_delta(&self, glyph: u32) -> Result<Option<f64>> {
        self.check(self.store.global_defects())?;
        let Some(advances) = self.store.advances() else {
            return Ok(None);
        };
        match advances.get(glyph as usize) {
            Some(variation) => self.scalar_delta(variation).map(Some),
            None => Ok(Some(0.0)),
        }
    }

    /// Delta of an `MVAR` metric; zero for metrics the font does not vary.
    pub fn metric_delta(&self, tag: Tag) -> Result<f64> {
        self.check(self.store.global_defects())?;
        match self.store.metric(tag) {
            Some(variation) => self.scalar_delta(variation),
            None => Ok(0.0),
        }
    }

    pub fn delta(&self, quantity: Quantity) -> Result<Delta> {
        match quantity {
            Quantity::OutlinePoint { glyph, point } => {
                let delta = self
                    .glyph_deltas(glyph)?
                    .and_then(|deltas| deltas.get(point).copied())
                    .unwrap_or(Vec2::ZERO);
                Ok(Delta::Point(delta))
            }
            Quantity::AdvanceWidth(glyph) => {
                if let Some(delta) = self.advance_delta(glyph)? {
                    return Ok(Delta::Scalar(delta));
                }
                // Without HVAR the advance follows the horizontal phantom
                // points.
                let delta = self
                    .glyph_deltas(glyph)?
                    .and_then(|deltas| {
                        let phantoms = deltas.len().checked_sub(PHANTOM_POINTS)?;
                        Some(deltas[phantoms + 1].x - deltas[phantoms].x)
                    })
                    .unwrap_or(0.0);
                Ok(Delta::Scalar(delta))
            }
            Quantity::Metric(tag) => self.metric_delta(tag).map(Delta::Scalar),
        }
    }

    fn scalar_delta(&self, variation: &ScalarVariation) -> Result<f64> {
        self.check(&variation.defects)?;
        Ok(variation
            .tuples
            .iter()
            .map(|tuple| self.scalar(tuple.region) * f64::from(tuple.delta))
            .sum())
    }
}

/// Unscaled deltas of a sparse tuple for every point, untouched outline
/// points inferred.
fn sparse_deltas(variation: &GlyphVariation, points: &[(usize, PointDelta)]) -> Vec<Vec2> {
    if let Some(shape) = &variation.shape
        && shape.coords.len() + PHANTOM_POINTS == variation.points
    {
        return iup::infer_deltas(shape, points, variation.points);
    }
    let mut deltas = vec![Vec2::ZERO; variation.points];
    for (index, delta) in points {
        if let Some(slot) = deltas.get_mut(*index) {
            *slot = Vec2::new(f64::from(delta.x), f64::from(delta.y));
        }
    }
    deltas
}
