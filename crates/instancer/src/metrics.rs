//! Font-wide metric tables: `head`, `hhea`, `OS/2` and `post`.

use read_fonts::{
    TableProvider,
    tables::mvar::tags as mvar_tags,
    types::{Fixed, Tag},
};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        head::{Head, MacStyle},
        hhea::Hhea,
        loca::LocaFormat,
        os2::{Os2, SelectionFlags},
        post::Post,
    },
};

use crate::{
    container::FontContainer,
    error::Result,
    glyphs::{GlyphSet, clamp_i16, compiled},
    interpolate::{Interpolator, ot_round},
    naming::Style,
};

const HEAD: Tag = Tag::new(b"head");
const HHEA: Tag = Tag::new(b"hhea");
const OS2: Tag = Tag::new(b"OS/2");
const POST: Tag = Tag::new(b"post");

const WGHT: Tag = Tag::new(b"wght");
const WDTH: Tag = Tag::new(b"wdth");
const SLNT: Tag = Tag::new(b"slnt");

/// Bounding box and horizontal extremes over every glyph with an outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontBounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
}

impl FontBounds {
    pub fn measure(glyphs: &GlyphSet) -> Self {
        let mut bounds = FontBounds {
            advance_width_max: glyphs.advances().iter().copied().max().unwrap_or(0),
            ..Default::default()
        };
        let mut seen = false;
        let (mut min_lsb, mut min_rsb, mut max_extent) = (i32::MAX, i32::MAX, i32::MIN);

        for ((bbox, advance), lsb) in glyphs.bboxes().iter().zip(glyphs.advances()).zip(glyphs.lsbs()) {
            let Some(bbox) = bbox else {
                continue;
            };
            if seen {
                bounds.x_min = bounds.x_min.min(bbox.x_min);
                bounds.y_min = bounds.y_min.min(bbox.y_min);
                bounds.x_max = bounds.x_max.max(bbox.x_max);
                bounds.y_max = bounds.y_max.max(bbox.y_max);
            } else {
                (bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max) =
                    (bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max);
                seen = true;
            }

            let width = i32::from(bbox.x_max) - i32::from(bbox.x_min);
            let extent = i32::from(*lsb) + width;
            min_lsb = min_lsb.min(i32::from(*lsb));
            min_rsb = min_rsb.min(i32::from(*advance) - extent);
            max_extent = max_extent.max(extent);
        }

        if seen {
            bounds.min_left_side_bearing = clamp_i16(f64::from(min_lsb));
            bounds.min_right_side_bearing = clamp_i16(f64::from(min_rsb));
            bounds.x_max_extent = clamp_i16(f64::from(max_extent));
        }
        bounds
    }
}

/// A base value plus its `MVAR` delta.
fn varied(interpolator: &Interpolator, base: i16, tag: Tag) -> Result<i16> {
    Ok(clamp_i16(ot_round(f64::from(base) + interpolator.metric_delta(tag)?)))
}

fn varied_u16(interpolator: &Interpolator, base: u16, tag: Tag) -> Result<u16> {
    let value = ot_round(f64::from(base) + interpolator.metric_delta(tag)?);
    Ok(value.clamp(0.0, f64::from(u16::MAX)) as u16)
}

/// `head` with the new bounding box and `loca` format. The checksum
/// adjustment is left for the serializer.
pub fn head(
    font: &FontContainer,
    bounds: &FontBounds,
    loca_format: LocaFormat,
    style: Option<Style>,
) -> Result<Vec<u8>> {
    let mut head: Head = font.head()?.to_owned_table();
    head.checksum_adjustment = 0;
    head.x_min = bounds.x_min;
    head.y_min = bounds.y_min;
    head.x_max = bounds.x_max;
    head.y_max = bounds.y_max;
    head.index_to_loc_format = match loca_format {
        LocaFormat::Short => 0,
        LocaFormat::Long => 1,
    };
    if let Some(style) = style {
        let mut mac_style = head.mac_style;
        mac_style.remove(MacStyle::BOLD | MacStyle::ITALIC);
        if style.bold {
            mac_style.insert(MacStyle::BOLD);
        }
        if style.italic {
            mac_style.insert(MacStyle::ITALIC);
        }
        head.mac_style = mac_style;
    }
    compiled(HEAD, write_fonts::dump_table(&head))
}

pub fn hhea(
    font: &FontContainer,
    bounds: &FontBounds,
    number_of_h_metrics: u16,
    interpolator: &Interpolator,
) -> Result<Vec<u8>> {
    let original = font.hhea()?;
    let hhea = Hhea {
        ascender: varied(interpolator, original.ascender().to_i16(), mvar_tags::HASC)?.into(),
        descender: varied(interpolator, original.descender().to_i16(), mvar_tags::HDSC)?.into(),
        line_gap: varied(interpolator, original.line_gap().to_i16(), mvar_tags::HLGP)?.into(),
        advance_width_max: bounds.advance_width_max.into(),
        min_left_side_bearing: bounds.min_left_side_bearing.into(),
        min_right_side_bearing: bounds.min_right_side_bearing.into(),
        x_max_extent: bounds.x_max_extent.into(),
        caret_slope_rise: varied(interpolator, original.caret_slope_rise(), mvar_tags::HCRS)?,
        caret_slope_run: varied(interpolator, original.caret_slope_run(), mvar_tags::HCRN)?,
        caret_offset: varied(interpolator, original.caret_offset(), mvar_tags::HCOF)?,
        number_of_h_metrics,
    };
    compiled(HHEA, write_fonts::dump_table(&hhea))
}

/// Map a `wdth` percentage to the nearest `usWidthClass`.
pub fn width_class(wdth: f32) -> u16 {
    match wdth {
        w if w <= 56.25 => 1,
        w if w <= 68.75 => 2,
        w if w <= 81.25 => 3,
        w if w <= 93.75 => 4,
        w if w <= 106.25 => 5,
        w if w <= 118.75 => 6,
        w if w <= 137.5 => 7,
        w if w <= 175.0 => 8,
        _ => 9,
    }
}

pub fn weight_class(wght: f32) -> u16 {
    (wght.round() as i32).clamp(1, 1000) as u16
}

/// User values of the instance, in axis order, for the axes that drive
/// `OS/2` and `post` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StyleAxes {
    pub weight: Option<f32>,
    pub width: Option<f32>,
    pub slant: Option<f32>,
}

impl StyleAxes {
    pub fn from_location(values: impl IntoIterator<Item = (Tag, f32)>) -> Self {
        let mut axes = StyleAxes::default();
        for (tag, value) in values {
            match tag {
                WGHT => axes.weight = Some(value),
                WDTH => axes.width = Some(value),
                SLNT => axes.slant = Some(value),
                _ => {}
            }
        }
        axes
    }
}

pub fn os2(
    font: &FontContainer,
    interpolator: &Interpolator,
    axes: &StyleAxes,
    style: Option<Style>,
) -> Result<Vec<u8>> {
    let original = font.os2()?;
    let mut os2: Os2 = original.to_owned_table();

    if let Some(weight) = axes.weight {
        os2.us_weight_class = weight_class(weight);
    }
    if let Some(width) = axes.width {
        os2.us_width_class = width_class(width);
    }

    os2.s_typo_ascender = varied(interpolator, original.s_typo_ascender(), mvar_tags::HASC)?;
    os2.s_typo_descender = varied(interpolator, original.s_typo_descender(), mvar_tags::HDSC)?;
    os2.s_typo_line_gap = varied(interpolator, original.s_typo_line_gap(), mvar_tags::HLGP)?;
    os2.us_win_ascent = varied_u16(interpolator, original.us_win_ascent(), mvar_tags::HCLA)?;
    os2.us_win_descent = varied_u16(interpolator, original.us_win_descent(), mvar_tags::HCLD)?;

    os2.y_subscript_x_size = varied(interpolator, original.y_subscript_x_size(), mvar_tags::SBXS)?;
    os2.y_subscript_y_size = varied(interpolator, original.y_subscript_y_size(), mvar_tags::SBYS)?;
    os2.y_subscript_x_offset = varied(interpolator, original.y_subscript_x_offset(), mvar_tags::SBXO)?;
    os2.y_subscript_y_offset = varied(interpolator, original.y_subscript_y_offset(), mvar_tags::SBYO)?;
    os2.y_superscript_x_size = varied(interpolator, original.y_superscript_x_size(), mvar_tags::SPXS)?;
    os2.y_superscript_y_size = varied(interpolator, original.y_superscript_y_size(), mvar_tags::SPYS)?;
    os2.y_superscript_x_offset =
        varied(interpolator, original.y_superscript_x_offset(), mvar_tags::SPXO)?;
    os2.y_superscript_y_offset =
        varied(interpolator, original.y_superscript_y_offset(), mvar_tags::SPYO)?;
    os2.y_strikeout_size = varied(interpolator, original.y_strikeout_size(), mvar_tags::STRS)?;
    os2.y_strikeout_position = varied(interpolator, original.y_strikeout_position(), mvar_tags::STRO)?;

    if let Some(x_height) = original.sx_height() {
        os2.sx_height = Some(varied(interpolator, x_height, mvar_tags::XHGT)?);
    }
    if let Some(cap_height) = original.s_cap_height() {
        os2.s_cap_height = Some(varied(interpolator, cap_height, mvar_tags::CPHT)?);
    }

    if let Some(style) = style {
        let mut selection = os2.fs_selection;
        selection.remove(SelectionFlags::ITALIC | SelectionFlags::BOLD | SelectionFlags::REGULAR);
        if style.bold {
            selection.insert(SelectionFlags::BOLD);
        }
        if style.italic {
            selection.insert(SelectionFlags::ITALIC);
        }
        if !style.bold && !style.italic {
            selection.insert(SelectionFlags::REGULAR);
        }
        os2.fs_selection = selection;
    }
    compiled(OS2, write_fonts::dump_table(&os2))
}

pub fn post(font: &FontContainer, interpolator: &Interpolator, axes: &StyleAxes) -> Result<Vec<u8>> {
    let original = font.post()?;
    let mut post: Post = original.to_owned_table();

    post.underline_position =
        varied(interpolator, original.underline_position().to_i16(), mvar_tags::UNDO)?.into();
    post.underline_thickness =
        varied(interpolator, original.underline_thickness().to_i16(), mvar_tags::UNDS)?.into();
    if let Some(slant) = axes.slant {
        post.italic_angle = Fixed::from_f64(f64::from(slant.clamp(-90.0, 90.0)));
    }
    compiled(POST, write_fonts::dump_table(&post))
}
