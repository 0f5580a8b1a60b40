//! Glyph outlines and horizontal metrics of a static instance.

use kurbo::{Affine, Rect, Vec2};
use read_fonts::{
    TableProvider,
    tables::glyf::{
        Anchor, CompositeGlyph as ReadCompositeGlyph, CurvePoint, Glyph as ReadGlyph,
        SimpleGlyph as ReadSimpleGlyph,
    },
    types::{GlyphId, Tag},
};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        glyf::{Bbox, Component, CompositeGlyph, Contour, GlyfLocaBuilder, Glyph, SimpleGlyph},
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
    },
};

use crate::{
    container::FontContainer,
    error::{Result, SerializationError},
    interpolate::{Interpolator, ot_round},
    store::PHANTOM_POINTS,
};

const GLYF: Tag = Tag::new(b"glyf");

pub(crate) fn clamp_i16(value: f64) -> i16 {
    value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Instantiated glyphs with their horizontal metrics.
#[derive(Debug, Clone)]
pub struct GlyphSet {
    glyphs: Vec<Glyph>,
    bboxes: Vec<Option<Bbox>>,
    advances: Vec<u16>,
    lsbs: Vec<i16>,
}

/// Compiled `glyf` and `loca`.
pub struct GlyphTables {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub loca_format: LocaFormat,
}

struct PendingGlyph {
    glyph: Glyph,
    /// Whether the outline or a component placement moved.
    changed: bool,
    /// Horizontal phantom points after variation, unrounded.
    left: f64,
    right: f64,
    hvar_advance: Option<f64>,
}

impl GlyphSet {
    /// Apply the interpolator to every glyph of `font`.
    ///
    /// Glyphs nothing varies are carried over unchanged, instructions and
    /// bounding box included. Composite bounding boxes are recomputed when a
    /// component moved or one of the referenced glyphs changed.
    pub fn instantiate(font: &FontContainer, interpolator: &Interpolator) -> Result<Self> {
        let num_glyphs = u32::from(font.maxp()?.num_glyphs());
        let glyf = font.glyf()?;
        let loca = font.loca(None)?;
        let hmtx = font.hmtx()?;

        let mut pending = Vec::with_capacity(num_glyphs as usize);
        for gid in 0..num_glyphs {
            let glyph_id = GlyphId::new(gid);
            let base_advance = f64::from(hmtx.advance(glyph_id).unwrap_or(0));
            let base_lsb = f64::from(hmtx.side_bearing(glyph_id).unwrap_or(0));
            let deltas = interpolator.glyph_deltas(gid)?;

            let (glyph, x_min, changed) = match loca.get_glyf(glyph_id, &glyf)? {
                None => (Glyph::Empty, 0, false),
                Some(ReadGlyph::Simple(simple)) => {
                    let x_min = simple.x_min();
                    match &deltas {
                        Some(deltas) => (vary_simple(&simple, deltas), x_min, true),
                        None => (Glyph::Simple(simple.to_owned_table()), x_min, false),
                    }
                }
                Some(ReadGlyph::Composite(composite)) => {
                    let x_min = composite.x_min();
                    match &deltas {
                        Some(deltas) => (vary_composite(&composite, deltas), x_min, true),
                        None => (Glyph::Composite(composite.to_owned_table()), x_min, false),
                    }
                }
            };

            let left = f64::from(x_min) - base_lsb;
            let right = left + base_advance;
            let (left, right) = match deltas.as_deref().and_then(horizontal_phantoms) {
                Some((dl, dr)) => (left + dl, right + dr),
                None => (left, right),
            };

            pending.push(PendingGlyph {
                glyph,
                changed,
                left,
                right,
                hvar_advance: interpolator.advance_delta(gid)?.map(|d| base_advance + d),
            });
        }

        let mut set = GlyphSet {
            bboxes: pending.iter().map(|p| own_bbox(&p.glyph)).collect(),
            glyphs: Vec::with_capacity(pending.len()),
            advances: Vec::with_capacity(pending.len()),
            lsbs: Vec::with_capacity(pending.len()),
        };
        let changed: Vec<bool> = pending.iter().map(|p| p.changed).collect();
        let mut glyphs: Vec<Glyph> = Vec::with_capacity(pending.len());
        let mut phantoms = Vec::with_capacity(pending.len());
        for p in pending {
            glyphs.push(p.glyph);
            phantoms.push((p.left, p.right, p.hvar_advance));
        }
        recompute_composite_bboxes(&mut glyphs, &mut set.bboxes, changed);

        for (glyph, (left, right, hvar_advance)) in glyphs.into_iter().zip(phantoms) {
            let gid = set.glyphs.len();
            let advance = match hvar_advance {
                Some(advance) => ot_round(advance),
                None => ot_round(right - left),
            };
            let x_min = set.bboxes[gid].map_or(0, |b| b.x_min);
            set.advances.push(advance.clamp(0.0, f64::from(u16::MAX)) as u16);
            set.lsbs.push(clamp_i16(f64::from(x_min) - ot_round(left)));
            set.glyphs.push(glyph);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Bounding box of every glyph; `None` for glyphs without outline.
    pub fn bboxes(&self) -> &[Option<Bbox>] {
        &self.bboxes
    }

    pub fn advances(&self) -> &[u16] {
        &self.advances
    }

    pub fn lsbs(&self) -> &[i16] {
        &self.lsbs
    }

    /// Number of long metrics once trailing repeated advances are folded.
    pub fn number_of_h_metrics(&self) -> u16 {
        let mut count = self.advances.len();
        while count > 1 && self.advances[count - 1] == self.advances[count - 2] {
            count -= 1;
        }
        count as u16
    }

    pub fn hmtx(&self) -> Hmtx {
        let long = usize::from(self.number_of_h_metrics());
        let h_metrics = self.advances[..long]
            .iter()
            .zip(&self.lsbs)
            .map(|(advance, side_bearing)| LongMetric { advance: *advance, side_bearing: *side_bearing })
            .collect();
        Hmtx { h_metrics, left_side_bearings: self.lsbs[long..].to_vec() }
    }

    pub fn compile(&self) -> Result<GlyphTables> {
        let mut builder = GlyfLocaBuilder::new();
        for glyph in &self.glyphs {
            builder.add_glyph(glyph).map_err(|err| SerializationError::Compile {
                tag: GLYF,
                reason: err.to_string(),
            })?;
        }
        let (glyf, loca, loca_format) = builder.build();
        Ok(GlyphTables {
            glyf: compiled(GLYF, write_fonts::dump_table(&glyf))?,
            loca: compiled(Tag::new(b"loca"), write_fonts::dump_table(&loca))?,
            loca_format,
        })
    }
}

/// Attach the table tag to a compile failure.
pub(crate) fn compiled<E: std::fmt::Display>(
    tag: Tag,
    result: std::result::Result<Vec<u8>, E>,
) -> Result<Vec<u8>> {
    result.map_err(|err| SerializationError::Compile { tag, reason: err.to_string() }.into())
}

/// Deltas of the left and right phantom points.
fn horizontal_phantoms(deltas: &[Vec2]) -> Option<(f64, f64)> {
    let first = deltas.len().checked_sub(PHANTOM_POINTS)?;
    Some((deltas[first].x, deltas[first + 1].x))
}

fn vary_simple(simple: &ReadSimpleGlyph, deltas: &[Vec2]) -> Glyph {
    let points: Vec<CurvePoint> = simple
        .points()
        .zip(deltas.iter().chain(std::iter::repeat(&Vec2::ZERO)))
        .map(|(point, delta)| {
            CurvePoint::new(
                clamp_i16(ot_round(f64::from(point.x) + delta.x)),
                clamp_i16(ot_round(f64::from(point.y) + delta.y)),
                point.on_curve,
            )
        })
        .collect();

    let mut contours = Vec::new();
    let mut start = 0;
    for end in simple.end_pts_of_contours() {
        let end = usize::from(end.get()) + 1;
        if let Some(contour) = points.get(start..end) {
            contours.push(Contour::from(contour.to_vec()));
        }
        start = end;
    }

    let mut glyph = SimpleGlyph {
        bbox: Bbox::default(),
        contours,
        instructions: simple.instructions().to_vec(),
    };
    glyph.recompute_bounding_box();
    Glyph::Simple(glyph)
}

/// Moves component offsets. Point-anchored components cannot move. The
/// bounding box is filled in later.
fn vary_composite(composite: &ReadCompositeGlyph, deltas: &[Vec2]) -> Glyph {
    let mut components = composite.components().enumerate().map(|(i, component)| {
        let delta = deltas.get(i).copied().unwrap_or(Vec2::ZERO);
        let anchor = match component.anchor {
            Anchor::Offset { x, y } => Anchor::Offset {
                x: clamp_i16(ot_round(f64::from(x) + delta.x)),
                y: clamp_i16(ot_round(f64::from(y) + delta.y)),
            },
            point @ Anchor::Point { .. } => point,
        };
        Component::new(component.glyph, anchor, component.transform, component.flags)
    });

    let Some(first) = components.next() else {
        return Glyph::Empty;
    };
    let mut glyph = CompositeGlyph::new(first, Bbox::default());
    for component in components {
        glyph.add_component(component, Bbox::default());
    }
    Glyph::Composite(glyph)
}

fn own_bbox(glyph: &Glyph) -> Option<Bbox> {
    match glyph {
        Glyph::Empty => None,
        Glyph::Simple(simple) if simple.contours.is_empty() => None,
        Glyph::Simple(simple) => Some(simple.bbox),
        Glyph::Composite(composite) => Some(composite.bbox),
    }
}

/// Resolve composite boxes that depend on changed glyphs. A composite is
/// dirty when it moved itself or references a dirty glyph; dirty composites
/// are resolved once all their components are.
fn recompute_composite_bboxes(glyphs: &mut [Glyph], bboxes: &mut [Option<Bbox>], mut dirty: Vec<bool>) {
    let mut spread = true;
    while spread {
        spread = false;
        for gid in 0..glyphs.len() {
            if dirty[gid] {
                continue;
            }
            if let Glyph::Composite(composite) = &glyphs[gid]
                && composite
                    .components()
                    .iter()
                    .any(|c| dirty.get(c.glyph.to_u32() as usize).copied().unwrap_or(false))
            {
                dirty[gid] = true;
                spread = true;
            }
        }
    }

    let mut resolved: Vec<bool> = dirty
        .iter()
        .zip(glyphs.iter())
        .map(|(dirty, glyph)| !(*dirty && matches!(glyph, Glyph::Composite(_))))
        .collect();
    let mut progress = true;
    while progress {
        progress = false;
        for gid in 0..glyphs.len() {
            if resolved[gid] {
                continue;
            }
            let Glyph::Composite(composite) = &glyphs[gid] else {
                continue;
            };
            let Some(bbox) = composite_bbox(composite, bboxes, &resolved) else {
                continue;
            };
            bboxes[gid] = bbox;
            if let (Glyph::Composite(composite), Some(bbox)) = (&mut glyphs[gid], bbox) {
                composite.bbox = bbox;
            }
            resolved[gid] = true;
            progress = true;
        }
    }
}

/// Union of the transformed component boxes, or `None` while a component
/// is unresolved. Cyclic references never resolve and keep their old box.
fn composite_bbox(composite: &CompositeGlyph, bboxes: &[Option<Bbox>], resolved: &[bool]) -> Option<Option<Bbox>> {
    let mut union: Option<Rect> = None;
    for component in composite.components() {
        let gid = component.glyph.to_u32() as usize;
        if !resolved.get(gid).copied().unwrap_or(true) {
            return None;
        }
        let Some(Some(bbox)) = bboxes.get(gid) else {
            continue;
        };
        let (dx, dy) = match component.anchor {
            Anchor::Offset { x, y } => (f64::from(x), f64::from(y)),
            Anchor::Point { .. } => (0.0, 0.0),
        };
        let t = &component.transform;
        let affine = Affine::new([
            f64::from(t.xx.to_f32()),
            f64::from(t.yx.to_f32()),
            f64::from(t.xy.to_f32()),
            f64::from(t.yy.to_f32()),
            dx,
            dy,
        ]);
        let rect = Rect::new(
            f64::from(bbox.x_min),
            f64::from(bbox.y_min),
            f64::from(bbox.x_max),
            f64::from(bbox.y_max),
        );
        let moved = affine.transform_rect_bbox(rect);
        union = Some(union.map_or(moved, |u| u.union(moved)));
    }
    Some(union.map(|r| Bbox {
        x_min: clamp_i16(ot_round(r.x0)),
        y_min: clamp_i16(ot_round(r.y0)),
        x_max: clamp_i16(ot_round(r.x1)),
        y_max: clamp_i16(ot_round(r.y1)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AxisLocation, location::Normalizer, registry::extract_axes, store::VariationStore};

    fn instantiate(value: f32) -> GlyphSet {
        let font = FontContainer::parse(font_test_data::VAZIRMATN_VAR).unwrap();
        let axes = extract_axes(&font).unwrap();
        let store = VariationStore::load(&font, &axes).unwrap();
        let coord = Normalizer::load(&font, &axes)
            .unwrap()
            .resolve(&[AxisLocation::new("wght", value)], false)
            .unwrap()
            .normalized;
        GlyphSet::instantiate(&font, &Interpolator::new(&store, &coord)).unwrap()
    }

    #[test]
    fn default_keeps_metrics() {
        let set = instantiate(400.0);
        assert_eq!(set.advances(), &[908, 1336, 1336, 633]);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn lsb_tracks_x_min() {
        let set = instantiate(650.0);
        for (bbox, lsb) in set.bboxes().iter().zip(set.lsbs()) {
            if let Some(bbox) = bbox {
                assert_eq!(*lsb, bbox.x_min);
            }
        }
    }

    #[test]
    fn heavier_glyphs_are_wider() {
        let thin = instantiate(100.0);
        let black = instantiate(900.0);
        assert_ne!(thin.advances()[1], black.advances()[1]);
        assert_ne!(thin.bboxes()[1], black.bboxes()[1]);
    }

    #[test]
    fn trailing_advances_fold() {
        let set = GlyphSet {
            glyphs: vec![Glyph::Empty; 4],
            bboxes: vec![None; 4],
            advances: vec![500, 600, 600, 600],
            lsbs: vec![0, 1, 2, 3],
        };
        assert_eq!(set.number_of_h_metrics(), 2);
        let hmtx = set.hmtx();
        assert_eq!(hmtx.h_metrics.len(), 2);
        assert_eq!(hmtx.left_side_bearings, vec![2, 3]);
    }

    #[test]
    fn composite_box_follows_components() {
        let square = SimpleGlyph {
            bbox: Bbox { x_min: 0, y_min: 0, x_max: 100, y_max: 100 },
            contours: vec![Contour::from(vec![
                CurvePoint::on_curve(0, 0),
                CurvePoint::on_curve(0, 100),
                CurvePoint::on_curve(100, 100),
                CurvePoint::on_curve(100, 0),
            ])],
            instructions: vec![],
        };
        let component = Component::new(
            read_fonts::types::GlyphId16::new(0),
            Anchor::Offset { x: 50, y: -10 },
            Default::default(),
            write_fonts::tables::glyf::ComponentFlags::default(),
        );
        let mut glyphs = vec![
            Glyph::Simple(square),
            Glyph::Composite(CompositeGlyph::new(component, Bbox::default())),
        ];
        let mut bboxes = vec![Some(Bbox { x_min: 0, y_min: 0, x_max: 100, y_max: 100 }), Some(Bbox::default())];
        recompute_composite_bboxes(&mut glyphs, &mut bboxes, vec![true, false]);
        assert_eq!(bboxes[1], Some(Bbox { x_min: 50, y_min: -10, x_max: 150, y_max: 90 }));
    }
}
