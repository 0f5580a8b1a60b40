//! User-space to normalized coordinates.

use log::{debug, warn};
use read_fonts::{TableProvider, types::Tag};

use crate::{
    AxisLocation,
    container::FontContainer,
    error::{Error, FormatError, Result},
    registry::Axis,
};

const AVAR: Tag = Tag::new(b"avar");
const F2DOT14_ONE: f64 = 16384.0;

/// Round to the nearest F2Dot14 value, ties toward positive infinity.
pub fn quantize(value: f64) -> f64 {
    (value * F2DOT14_ONE + 0.5).floor() / F2DOT14_ONE
}

/// One value in `[-1, 1]` per axis, in axis order, quantized to F2Dot14.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCoordinate(Vec<f64>);

impl NormalizedCoordinate {
    /// The default location: every axis at 0.
    pub fn origin(axis_count: usize) -> Self {
        Self(vec![0.0; axis_count])
    }

    pub fn new(values: Vec<f64>) -> Self {
        Self(values.into_iter().map(|v| quantize(v.clamp(-1.0, 1.0))).collect())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_origin(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

/// A requested location after clamping and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Clamped user value for every axis, in axis order.
    pub user: Vec<f32>,
    pub normalized: NormalizedCoordinate,
}

impl ResolvedLocation {
    pub fn user_value(&self, axes: &[Axis], tag: Tag) -> Option<f32> {
        let index = axes.iter().position(|a| a.tag == tag)?;
        self.user.get(index).copied()
    }
}

/// Default normalization: `min -> -1`, `default -> 0`, `max -> 1`, linear in
/// between. The value is clamped first.
pub fn normalize_value(axis: &Axis, value: f32) -> f64 {
    let value = f64::from(axis.clamp(value));
    let (min, default, max) = (f64::from(axis.min), f64::from(axis.default), f64::from(axis.max));
    if value < default {
        -(default - value) / (default - min)
    } else if value > default {
        (value - default) / (max - default)
    } else {
        0.0
    }
}

/// Piecewise linear `avar` segment map for a single axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentMap(Vec<(f64, f64)>);

impl SegmentMap {
    pub fn new(mut pairs: Vec<(f64, f64)>) -> Self {
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self(pairs)
    }

    /// True when every mapped value is left where it is.
    pub fn is_identity(&self) -> bool {
        self.0.iter().all(|(from, to)| from == to)
    }

    /// Map a normalized value. Outside the mapped range the value is shifted
    /// by the offset of the nearest end point.
    pub fn map(&self, value: f64) -> f64 {
        let pairs = &self.0;
        let (Some(first), Some(last)) = (pairs.first(), pairs.last()) else {
            return value;
        };
        if let Some((_, to)) = pairs.iter().find(|(from, _)| *from == value) {
            return *to;
        }
        if value < first.0 {
            return value + first.1 - first.0;
        }
        if value > last.0 {
            return value + last.1 - last.0;
        }
        let upper = pairs.iter().position(|(from, _)| *from > value).unwrap_or(pairs.len() - 1);
        let (a, va) = pairs[upper - 1];
        let (b, vb) = pairs[upper];
        va + (vb - va) * (value - a) / (b - a)
    }
}

/// Turns user locations into normalized coordinates for one font.
#[derive(Debug, Clone)]
pub struct Normalizer {
    axes: Vec<Axis>,
    segments: Vec<SegmentMap>,
}

impl Normalizer {
    /// Build a normalizer from the font's axes and its optional `avar`.
    pub fn load(font: &FontContainer, axes: &[Axis]) -> Result<Self> {
        let mut segments = vec![SegmentMap::default(); axes.len()];
        if font.contains(AVAR) {
            let avar = font.avar()?;
            if usize::from(avar.axis_count()) != axes.len() {
                return Err(FormatError::Malformed {
                    tag: AVAR,
                    reason: "axis count differs from fvar",
                }
                .into());
            }
            let segment_maps = avar.axis_segment_maps();
            for ((slot, maps), axis) in segments.iter_mut().zip(segment_maps.iter()).zip(axes) {
                let maps = maps?;
                let map = SegmentMap::new(
                    maps.axis_value_maps()
                        .iter()
                        .map(|m| {
                            (
                                f64::from(m.from_coordinate().to_f32()),
                                f64::from(m.to_coordinate().to_f32()),
                            )
                        })
                        .collect(),
                );
                if map.is_identity() {
                    debug!("avar map for {} is the identity", axis.tag);
                } else {
                    *slot = map;
                }
            }
        }
        Ok(Self::new(axes.to_vec(), segments))
    }

    pub fn new(axes: Vec<Axis>, segments: Vec<SegmentMap>) -> Self {
        Self { axes, segments }
    }

    /// Resolve a partial user location. Axes that are not mentioned take
    /// their default; later entries for the same tag win.
    ///
    /// Out-of-range values are clamped silently unless `warn_on_clamp` is
    /// set.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAxis`] if the location names an axis the font does not
    /// have.
    pub fn resolve(&self, location: &[AxisLocation], warn_on_clamp: bool) -> Result<ResolvedLocation> {
        let mut user: Vec<f32> = self.axes.iter().map(|a| a.default).collect();
        for loc in location {
            let index = self
                .axes
                .iter()
                .position(|a| a.tag == loc.tag)
                .ok_or(Error::UnknownAxis(loc.tag))?;
            let axis = &self.axes[index];
            let clamped = axis.clamp(loc.value);
            if warn_on_clamp && clamped != loc.value {
                warn!(
                    "{}: {} is outside {}..{}, clamped to {clamped}",
                    axis.tag, loc.value, axis.min, axis.max
                );
            }
            user[index] = clamped;
        }

        let normalized = self
            .axes
            .iter()
            .zip(&self.segments)
            .zip(&user)
            .map(|((axis, segments), value)| {
                let default = quantize(normalize_value(axis, *value));
                quantize(segments.map(default))
            })
            .collect();

        Ok(ResolvedLocation { user, normalized: NormalizedCoordinate(normalized) })
    }
}
