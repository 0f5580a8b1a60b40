//! A tiny variable font built from scratch.
//!
//! One `wght` axis (100, 400, 900) and three glyphs:
//!
//! - 0: `.notdef`, empty
//! - 1: a square from (100, 0) to (400, 500) whose right edge and advance
//!   move by +50 at the peak of the region (0, 0.6, 1.0), i.e. `wght=700`
//! - 2: a composite of glyph 1 offset by (50, 0)
//!
//! `HVAR` and `MVAR` are optional and written by hand. `gvar` can be
//! replaced by a hand-packed one.

#![allow(dead_code)]

use read_fonts::{
    FontRef, TableProvider,
    tables::glyf::{Anchor, CurvePoint, Glyph as ReadGlyph},
    types::{F2Dot14, GlyphId, GlyphId16, NameId, Tag},
};
use write_fonts::{
    FontBuilder,
    tables::{
        cmap::Cmap,
        fvar::{AxisInstanceArrays, Fvar, InstanceRecord, VariationAxisRecord},
        glyf::{Bbox, Component, CompositeGlyph, Contour, GlyfLocaBuilder, Glyph, SimpleGlyph},
        gvar::{GlyphDelta, GlyphDeltas, GlyphVariations, Gvar, Tent},
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        maxp::Maxp,
        name::{Name, NameRecord},
        os2::Os2,
        post::Post,
    },
};

pub const FAMILY: &str = "Fixture Sans";
/// Default x of the square's right edge.
pub const RIGHT_EDGE: i16 = 400;
pub const ADVANCE: u16 = 500;
pub const X_HEIGHT: i16 = 500;
pub const ASCENDER: i16 = 700;

/// A region on the single axis: `(start, peak, end)`.
pub type Region = (f32, f32, f32);

pub const MAIN_REGION: Region = (0.0, 0.6, 1.0);
/// Deltas of the square at the peak of [`MAIN_REGION`]: four outline points,
/// then the phantom points.
pub const MAIN_DELTAS: [(i16, i16); 8] = [(0, 0), (0, 0), (50, 0), (50, 0), (0, 0), (50, 0), (0, 0), (0, 0)];

#[derive(Debug, Clone, Default)]
pub struct Fixture {
    hvar: Option<Vec<u8>>,
    mvar: Option<Vec<u8>>,
    gvar: Option<Vec<u8>>,
    no_gvar: bool,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hvar(mut self, data: Vec<u8>) -> Self {
        self.hvar = Some(data);
        self
    }

    pub fn mvar(mut self, data: Vec<u8>) -> Self {
        self.mvar = Some(data);
        self
    }

    pub fn gvar(mut self, data: Vec<u8>) -> Self {
        self.gvar = Some(data);
        self
    }

    pub fn without_gvar(mut self) -> Self {
        self.no_gvar = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut glyf_builder = GlyfLocaBuilder::new();
        for glyph in glyphs() {
            glyf_builder.add_glyph(&glyph).unwrap();
        }
        let (glyf, loca, loca_format) = glyf_builder.build();

        let head = Head {
            font_revision: font_types::Fixed::from_f64(1.0),
            checksum_adjustment: 0,
            magic_number: 0x5F0F3CF5,
            flags: write_fonts::tables::head::Flags::empty(),
            units_per_em: 1000,
            created: font_types::LongDateTime::new(0),
            modified: font_types::LongDateTime::new(0),
            x_min: 100,
            y_min: 0,
            x_max: 450,
            y_max: 500,
            mac_style: write_fonts::tables::head::MacStyle::empty(),
            lowest_rec_ppem: 8,
            font_direction_hint: 2,
            index_to_loc_format: match loca_format {
                write_fonts::tables::loca::LocaFormat::Short => 0,
                write_fonts::tables::loca::LocaFormat::Long => 1,
            },
        };

        let hhea = Hhea {
            ascender: font_types::FWord::new(ASCENDER),
            descender: font_types::FWord::new(-200),
            line_gap: font_types::FWord::new(0),
            advance_width_max: font_types::UfWord::new(ADVANCE),
            min_left_side_bearing: font_types::FWord::new(0),
            min_right_side_bearing: font_types::FWord::new(50),
            x_max_extent: font_types::FWord::new(450),
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            number_of_h_metrics: 3,
        };

        let hmtx = Hmtx {
            h_metrics: vec![
                LongMetric { advance: ADVANCE, side_bearing: 0 },
                LongMetric { advance: ADVANCE, side_bearing: 100 },
                LongMetric { advance: ADVANCE, side_bearing: 150 },
            ],
            left_side_bearings: vec![],
        };

        let maxp = Maxp {
            num_glyphs: 3,
            max_points: Some(4),
            max_contours: Some(1),
            max_composite_points: Some(4),
            max_composite_contours: Some(1),
            max_zones: Some(1),
            max_twilight_points: Some(0),
            max_storage: Some(0),
            max_function_defs: Some(0),
            max_instruction_defs: Some(0),
            max_stack_elements: Some(0),
            max_size_of_instructions: Some(0),
            max_component_elements: Some(1),
            max_component_depth: Some(1),
        };

        let post = Post {
            version: font_types::Version16Dot16::VERSION_3_0,
            italic_angle: font_types::Fixed::from_f64(0.0),
            underline_position: font_types::FWord::new(-100),
            underline_thickness: font_types::FWord::new(50),
            is_fixed_pitch: 0,
            min_mem_type42: 0,
            max_mem_type42: 0,
            min_mem_type1: 0,
            max_mem_type1: 0,
            num_glyphs: Some(3),
            glyph_name_index: None,
            string_data: None,
        };

        let cmap = Cmap::from_mappings(vec![('A', GlyphId::new(1)), ('B', GlyphId::new(2))]).expect("cmap");

        let mut builder = FontBuilder::new();
        builder.add_table(&head).unwrap();
        builder.add_table(&hhea).unwrap();
        builder.add_table(&hmtx).unwrap();
        builder.add_table(&maxp).unwrap();
        builder.add_table(&post).unwrap();
        builder.add_table(&make_os2()).unwrap();
        builder.add_table(&cmap).unwrap();
        builder.add_table(&glyf).unwrap();
        builder.add_table(&loca).unwrap();
        builder.add_table(&make_name()).unwrap();
        builder.add_table(&make_fvar()).unwrap();
        match &self.gvar {
            _ if self.no_gvar => {}
            Some(gvar) => {
                builder.add_raw(Tag::new(b"gvar"), gvar.clone());
            }
            None => {
                builder.add_table(&make_gvar()).unwrap();
            }
        }
        if let Some(hvar) = &self.hvar {
            builder.add_raw(Tag::new(b"HVAR"), hvar.clone());
        }
        if let Some(mvar) = &self.mvar {
            builder.add_raw(Tag::new(b"MVAR"), mvar.clone());
        }
        builder.build()
    }
}

pub fn fixture() -> Vec<u8> {
    Fixture::new().build()
}

fn glyphs() -> Vec<Glyph> {
    let square = SimpleGlyph {
        bbox: Bbox { x_min: 100, y_min: 0, x_max: RIGHT_EDGE, y_max: 500 },
        contours: vec![Contour::from(vec![
            CurvePoint::on_curve(100, 0),
            CurvePoint::on_curve(100, 500),
            CurvePoint::on_curve(RIGHT_EDGE, 500),
            CurvePoint::on_curve(RIGHT_EDGE, 0),
        ])],
        instructions: vec![],
    };
    let component = Component::new(
        GlyphId16::new(1),
        Anchor::Offset { x: 50, y: 0 },
        Default::default(),
        write_fonts::tables::glyf::ComponentFlags::default(),
    );
    let composite = CompositeGlyph::new(component, Bbox { x_min: 150, y_min: 0, x_max: 450, y_max: 500 });
    vec![Glyph::Empty, Glyph::Simple(square), Glyph::Composite(composite)]
}

fn make_gvar() -> Gvar {
    let tents = vec![Tent::new(
        F2Dot14::from_f32(MAIN_REGION.1),
        Some((F2Dot14::from_f32(MAIN_REGION.0), F2Dot14::from_f32(MAIN_REGION.2))),
    )];
    let deltas = MAIN_DELTAS
        .into_iter()
        .map(|(x, y)| GlyphDelta::required(x, y))
        .collect();
    let variations = vec![
        GlyphVariations::new(GlyphId::new(0), vec![]),
        GlyphVariations::new(GlyphId::new(1), vec![GlyphDeltas::new(tents, deltas)]),
        GlyphVariations::new(GlyphId::new(2), vec![]),
    ];
    Gvar::new(variations, 1).expect("gvar")
}

fn make_fvar() -> Fvar {
    let axes = vec![VariationAxisRecord {
        axis_tag: Tag::new(b"wght"),
        min_value: font_types::Fixed::from_f64(100.0),
        default_value: font_types::Fixed::from_f64(400.0),
        max_value: font_types::Fixed::from_f64(900.0),
        flags: 0u16,
        axis_name_id: NameId::new(256),
    }];
    // The last instance reuses the "Bold" name on purpose.
    let instances = [(257, 300.0), (258, 400.0), (259, 700.0), (259, 800.0)]
        .into_iter()
        .map(|(name_id, wght)| InstanceRecord {
            subfamily_name_id: NameId::new(name_id),
            flags: 0,
            coordinates: vec![font_types::Fixed::from_f64(wght)],
            post_script_name_id: None,
        })
        .collect();
    Fvar { axis_instance_arrays: AxisInstanceArrays { axes, instances }.into() }
}

fn make_name() -> Name {
    let mac = [(1, "Fixture Sans"), (2, "Regular")];
    let windows = [
        (1, "Fixture Sans"),
        (2, "Regular"),
        (4, "Fixture Sans Regular"),
        (6, "FixtureSans-Regular"),
        (256, "Weight"),
        (257, "Light"),
        (258, "Regular"),
        (259, "Bold"),
    ];
    let records = mac
        .into_iter()
        .map(|(id, s)| NameRecord::new(1, 0, 0, NameId::new(id), s.to_string().into()))
        .chain(
            windows
                .into_iter()
                .map(|(id, s)| NameRecord::new(3, 1, 0x409, NameId::new(id), s.to_string().into())),
        )
        .collect();
    Name::new(records)
}

fn make_os2() -> Os2 {
    Os2 {
        x_avg_char_width: 500,
        us_weight_class: 400,
        us_width_class: 5,
        fs_type: 0,
        y_subscript_x_size: 650,
        y_subscript_y_size: 600,
        y_subscript_x_offset: 0,
        y_subscript_y_offset: 75,
        y_superscript_x_size: 650,
        y_superscript_y_size: 600,
        y_superscript_x_offset: 0,
        y_superscript_y_offset: 350,
        y_strikeout_size: 50,
        y_strikeout_position: 300,
        s_family_class: 0,
        panose_10: [0; 10],
        ul_unicode_range_1: 0,
        ul_unicode_range_2: 0,
        ul_unicode_range_3: 0,
        ul_unicode_range_4: 0,
        ach_vend_id: font_types::Tag::new(b"NONE"),
        fs_selection: write_fonts::tables::os2::SelectionFlags::REGULAR,
        us_first_char_index: 0x41,
        us_last_char_index: 0x42,
        s_typo_ascender: ASCENDER,
        s_typo_descender: -200,
        s_typo_line_gap: 0,
        us_win_ascent: 900,
        us_win_descent: 200,
        ul_code_page_range_1: Some(0),
        ul_code_page_range_2: Some(0),
        sx_height: Some(X_HEIGHT),
        s_cap_height: Some(700),
        us_default_char: Some(0),
        us_break_char: Some(0x20),
        us_max_context: Some(0),
        us_lower_optical_point_size: None,
        us_upper_optical_point_size: None,
    }
}

fn f2dot14(value: f32) -> [u8; 2] {
    ((value * 16384.0).round() as i16).to_be_bytes()
}

/// An item variation store with one axis and a single subtable. Every
/// delta is stored as a word.
pub fn item_variation_store(regions: &[Region], rows: &[Vec<i16>]) -> Vec<u8> {
    let region_list_len = 4 + regions.len() * 6;
    let mut out = Vec::new();
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&12u32.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&((12 + region_list_len) as u32).to_be_bytes());

    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(regions.len() as u16).to_be_bytes());
    for (start, peak, end) in regions {
        out.extend_from_slice(&f2dot14(*start));
        out.extend_from_slice(&f2dot14(*peak));
        out.extend_from_slice(&f2dot14(*end));
    }

    let region_count = regions.len() as u16;
    out.extend_from_slice(&(rows.len() as u16).to_be_bytes());
    out.extend_from_slice(&region_count.to_be_bytes());
    out.extend_from_slice(&region_count.to_be_bytes());
    for index in 0..region_count {
        out.extend_from_slice(&index.to_be_bytes());
    }
    for row in rows {
        assert_eq!(row.len(), regions.len());
        for delta in row {
            out.extend_from_slice(&delta.to_be_bytes());
        }
    }
    out
}

/// `gvar` with variations for the square only. Every tuple embeds its
/// peak and intermediate region and stores one delta per point as words.
pub fn gvar(tuples: &[(Region, Vec<(i16, i16)>)]) -> Vec<u8> {
    const HEADER_LEN: u32 = 20 + 4 * 4;
    let mut square = Vec::new();
    square.extend_from_slice(&(tuples.len() as u16).to_be_bytes());
    square.extend_from_slice(&((4 + tuples.len() * 10) as u16).to_be_bytes());
    let mut bodies = Vec::new();
    for ((start, peak, end), deltas) in tuples {
        assert!(!deltas.is_empty() && deltas.len() <= 64);
        let run = 0x40 | (deltas.len() as u8 - 1);
        let mut body = vec![run];
        body.extend(deltas.iter().flat_map(|(x, _)| x.to_be_bytes()));
        body.push(run);
        body.extend(deltas.iter().flat_map(|(_, y)| y.to_be_bytes()));

        square.extend_from_slice(&(body.len() as u16).to_be_bytes());
        square.extend_from_slice(&0xC000u16.to_be_bytes());
        square.extend_from_slice(&f2dot14(*peak));
        square.extend_from_slice(&f2dot14(*start));
        square.extend_from_slice(&f2dot14(*end));
        bodies.extend(body);
    }
    square.extend(bodies);

    let mut out = Vec::new();
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&HEADER_LEN.to_be_bytes());
    out.extend_from_slice(&3u16.to_be_bytes());
    // Long offsets.
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&HEADER_LEN.to_be_bytes());
    let end = square.len() as u32;
    for offset in [0, 0, end, end] {
        out.extend_from_slice(&offset.to_be_bytes());
    }
    out.extend(square);
    out
}

/// `HVAR` without mappings: row `n` holds the deltas of glyph `n`.
pub fn hvar(regions: &[Region], rows: &[Vec<i16>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&20u32.to_be_bytes());
    out.extend_from_slice(&[0; 12]);
    out.extend(item_variation_store(regions, rows));
    out
}

/// `MVAR` with one value record per row, in tag order.
pub fn mvar(regions: &[Region], records: &[(&[u8; 4], Vec<i16>)]) -> Vec<u8> {
    let mut records = records.to_vec();
    records.sort_by_key(|(tag, _)| **tag);
    let store_offset = 12 + records.len() * 8;

    let mut out = Vec::new();
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&8u16.to_be_bytes());
    out.extend_from_slice(&(records.len() as u16).to_be_bytes());
    out.extend_from_slice(&(store_offset as u16).to_be_bytes());
    for (inner, (tag, _)) in records.iter().enumerate() {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&(inner as u16).to_be_bytes());
    }
    let rows: Vec<Vec<i16>> = records.into_iter().map(|(_, row)| row).collect();
    out.extend(item_variation_store(regions, &rows));
    out
}

pub fn simple_points(font: &FontRef, gid: u32) -> Vec<(i16, i16)> {
    let glyf = font.glyf().unwrap();
    let loca = font.loca(None).unwrap();
    match loca.get_glyf(GlyphId::new(gid), &glyf).unwrap() {
        Some(ReadGlyph::Simple(simple)) => simple.points().map(|p| (p.x, p.y)).collect(),
        _ => vec![],
    }
}

/// `(x_min, y_min, x_max, y_max)` as stored in `glyf`.
pub fn glyph_bbox(font: &FontRef, gid: u32) -> Option<(i16, i16, i16, i16)> {
    let glyf = font.glyf().unwrap();
    let loca = font.loca(None).unwrap();
    loca.get_glyf(GlyphId::new(gid), &glyf)
        .unwrap()
        .map(|g| (g.x_min(), g.y_min(), g.x_max(), g.y_max()))
}

pub fn advance(font: &FontRef, gid: u32) -> u16 {
    font.hmtx().unwrap().advance(GlyphId::new(gid)).unwrap()
}

pub fn lsb(font: &FontRef, gid: u32) -> i16 {
    font.hmtx().unwrap().side_bearing(GlyphId::new(gid)).unwrap()
}

/// Every decodable string for `id`.
pub fn names(font: &FontRef, id: u16) -> Vec<String> {
    let name = font.name().unwrap();
    name.name_record()
        .iter()
        .filter(|r| r.name_id() == NameId::new(id))
        .filter_map(|r| r.string(name.string_data()).ok().map(|s| s.chars().collect()))
        .collect()
}
