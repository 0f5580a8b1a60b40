//! Inferred deltas for points a sparse tuple does not mention.
//!
//! Works on the unscaled tuple deltas. Each contour is handled on its own:
//! untouched points between two touched neighbours are interpolated when
//! their coordinate lies between the neighbours' and take the nearer
//! neighbour's delta otherwise. A contour with a single touched point moves
//! as a whole; one with none stays put.

use kurbo::Vec2;

use crate::store::{GlyphShape, PointDelta};

/// Deltas for all `total` points of a glyph. Points past the outline (the
/// phantom points) only move when the tuple names them.
pub fn infer_deltas(shape: &GlyphShape, touched: &[(usize, PointDelta)], total: usize) -> Vec<Vec2> {
    let mut deltas = vec![Vec2::ZERO; total];
    let mut has_delta = vec![false; total];
    for (index, delta) in touched {
        if let Some(slot) = deltas.get_mut(*index) {
            *slot = Vec2::new(f64::from(delta.x), f64::from(delta.y));
            has_delta[*index] = true;
        }
    }

    let points: Vec<Vec2> = shape
        .coords
        .iter()
        .map(|(x, y)| Vec2::new(f64::from(*x), f64::from(*y)))
        .collect();
    let limit = points.len().min(total);

    let mut start = 0;
    for &end in &shape.contour_ends {
        if end >= limit || end < start {
            break;
        }
        iup_contour(&mut deltas, &has_delta, &points, start, end);
        start = end + 1;
    }
    deltas
}

fn iup_contour(deltas: &mut [Vec2], has_delta: &[bool], points: &[Vec2], start: usize, end: usize) {
    let contour_len = end - start + 1;
    let touched: Vec<usize> = (0..contour_len).filter(|i| has_delta[start + i]).collect();

    match touched[..] {
        [] => {}
        [only] => {
            let d = deltas[start + only];
            for i in (0..contour_len).filter(|i| *i != only) {
                deltas[start + i] = d;
            }
        }
        _ => {
            for pair in touched.windows(2) {
                interpolate_between(deltas, points, start, contour_len, pair[0], pair[1]);
            }
            let (first, last) = (touched[0], touched[touched.len() - 1]);
            interpolate_between(deltas, points, start, contour_len, last, first);
        }
    }
}

/// Fill the untouched points strictly between `touch1` and `touch2`, walking
/// forward around the contour.
fn interpolate_between(
    deltas: &mut [Vec2],
    points: &[Vec2],
    start: usize,
    contour_len: usize,
    touch1: usize,
    touch2: usize,
) {
    let (p1, p2) = (points[start + touch1], points[start + touch2]);
    let (d1, d2) = (deltas[start + touch1], deltas[start + touch2]);

    let mut i = (touch1 + 1) % contour_len;
    while i != touch2 {
        let p = points[start + i];
        deltas[start + i] = Vec2::new(
            iup_single(p1.x, p2.x, p.x, d1.x, d2.x),
            iup_single(p1.y, p2.y, p.y, d1.y, d2.y),
        );
        i = (i + 1) % contour_len;
    }
}

fn iup_single(c1: f64, c2: f64, c: f64, d1: f64, d2: f64) -> f64 {
    if c1 == c2 {
        return if d1 == d2 { d1 } else { 0.0 };
    }
    let (c1, c2, d1, d2) = if c1 > c2 { (c2, c1, d2, d1) } else { (c1, c2, d1, d2) };
    if c <= c1 {
        d1
    } else if c >= c2 {
        d2
    } else {
        d1 + (c - c1) * (d2 - d1) / (c2 - c1)
    }
}
