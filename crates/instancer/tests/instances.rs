//! Building single instances of a hand-made variable font.

mod common;

use common::{Fixture, MAIN_REGION, Region, advance, fixture, glyph_bbox, lsb, names, simple_points};
use font_instancer::{
    AxisLocation, Error, InstanceRequest, InterpolationError, Options, VariableFont, instantiate, serialize,
};
use read_fonts::{FontRef, TableProvider, types::Tag};

fn at(wght: f32) -> Vec<u8> {
    instantiate(&fixture(), &[AxisLocation::new("wght", wght)]).unwrap()
}

fn right_edge(font: &FontRef) -> i16 {
    simple_points(font, 1)[2].0
}

#[test]
fn default_location_reproduces_the_outlines() {
    let input = fixture();
    let output = instantiate(&input, &[]).unwrap();
    let vf = FontRef::new(&input).unwrap();
    let font = FontRef::new(&output).unwrap();

    assert_eq!(simple_points(&font, 1), simple_points(&vf, 1));
    for gid in 0..3 {
        assert_eq!(advance(&font, gid), advance(&vf, gid), "glyph {gid}");
        assert_eq!(lsb(&font, gid), lsb(&vf, gid), "glyph {gid}");
        assert_eq!(glyph_bbox(&font, gid), glyph_bbox(&vf, gid), "glyph {gid}");
    }
    assert_eq!(font.maxp().unwrap().num_glyphs(), 3);
}

#[test]
fn variation_tables_are_removed() {
    let input = Fixture::new()
        .hvar(common::hvar(&[MAIN_REGION], &[vec![0], vec![80], vec![0]]))
        .mvar(common::mvar(&[MAIN_REGION], &[(b"xhgt", vec![20])]))
        .build();
    let output = instantiate(&input, &[AxisLocation::new("wght", 700.0)]).unwrap();
    let font = FontRef::new(&output).unwrap();
    for tag in [b"fvar", b"gvar", b"HVAR", b"MVAR"] {
        assert!(font.table_data(Tag::new(tag)).is_none(), "{}", Tag::new(tag));
    }
    assert!(font.table_data(Tag::new(b"cmap")).is_some());
}

#[test]
fn interpolates_along_the_axis() {
    for (wght, edge, width) in [(700.0, 450, 550), (550.0, 425, 525), (100.0, 400, 500), (400.0, 400, 500)] {
        let output = at(wght);
        let font = FontRef::new(&output).unwrap();
        assert_eq!(right_edge(&font), edge, "wght={wght}");
        assert_eq!(advance(&font, 1), width, "wght={wght}");
        // The left edge does not move.
        assert_eq!(lsb(&font, 1), 100, "wght={wght}");
    }
}

#[test]
fn out_of_range_values_are_clamped() {
    assert_eq!(at(50.0), at(100.0));
    assert_eq!(at(2000.0), at(900.0));
}

#[test]
fn output_is_deterministic() {
    assert_eq!(at(623.5), at(623.5));
}

#[test]
fn empty_location_is_the_default() {
    let input = fixture();
    let font = VariableFont::load(&input).unwrap();
    let options = Options::new().update_names(false);
    let empty = font.build(&InstanceRequest::at(vec![]), &options).unwrap();
    let explicit = font
        .build(&InstanceRequest::at(vec![AxisLocation::new("wght", 400.0)]), &options)
        .unwrap();
    assert_eq!(serialize(&empty).unwrap(), serialize(&explicit).unwrap());
}

#[test]
fn composites_follow_their_components() {
    let output = at(700.0);
    let font = FontRef::new(&output).unwrap();
    assert_eq!(glyph_bbox(&font, 2), Some((150, 0, 500, 500)));
    assert_eq!(lsb(&font, 2), 150);
    assert_eq!(font.head().unwrap().x_max(), 500);
    assert_eq!(font.hhea().unwrap().x_max_extent().to_i16(), 500);
}

#[test]
fn hvar_wins_over_phantom_points() {
    let input = Fixture::new()
        .hvar(common::hvar(&[MAIN_REGION], &[vec![0], vec![80], vec![0]]))
        .build();
    let output = instantiate(&input, &[AxisLocation::new("wght", 700.0)]).unwrap();
    let font = FontRef::new(&output).unwrap();
    assert_eq!(advance(&font, 1), 580);
    assert_eq!(right_edge(&font), 450);
}

#[test]
fn fonts_without_gvar_keep_their_outlines() {
    let input = Fixture::new().without_gvar().build();
    let output = instantiate(&input, &[AxisLocation::new("wght", 700.0)]).unwrap();
    let font = FontRef::new(&output).unwrap();
    assert_eq!(right_edge(&font), 400);
    assert_eq!(advance(&font, 1), 500);
}

#[test]
fn mvar_moves_font_metrics() {
    let input = Fixture::new()
        .mvar(common::mvar(&[MAIN_REGION], &[(b"xhgt", vec![20]), (b"hasc", vec![30])]))
        .build();
    let bold = instantiate(&input, &[AxisLocation::new("wght", 700.0)]).unwrap();
    let font = FontRef::new(&bold).unwrap();
    assert_eq!(font.os2().unwrap().sx_height(), Some(common::X_HEIGHT + 20));
    assert_eq!(font.os2().unwrap().s_typo_ascender(), common::ASCENDER + 30);
    assert_eq!(font.hhea().unwrap().ascender().to_i16(), common::ASCENDER + 30);

    let half = instantiate(&input, &[AxisLocation::new("wght", 550.0)]).unwrap();
    let font = FontRef::new(&half).unwrap();
    assert_eq!(font.os2().unwrap().sx_height(), Some(common::X_HEIGHT + 10));
}

#[test]
fn bold_instances_are_flagged() {
    let output = at(700.0);
    let font = FontRef::new(&output).unwrap();
    assert_eq!(names(&font, 1), ["Fixture Sans"; 2]);
    assert_eq!(names(&font, 2), ["Bold"; 2]);
    assert!(names(&font, 4).iter().all(|s| s == "Fixture Sans Bold"));
    assert!(names(&font, 16).is_empty());
    assert_eq!(font.os2().unwrap().us_weight_class(), 700);
    assert!(font.os2().unwrap().fs_selection().contains(read_fonts::tables::os2::SelectionFlags::BOLD));
    assert!(font.head().unwrap().mac_style().contains(read_fonts::tables::head::MacStyle::BOLD));
}

#[test]
fn other_instances_get_typographic_names() {
    let output = at(300.0);
    let font = FontRef::new(&output).unwrap();
    assert!(names(&font, 1).iter().all(|s| s == "Fixture Sans Light"));
    assert!(names(&font, 2).iter().all(|s| s == "Regular"));
    assert_eq!(names(&font, 16), ["Fixture Sans"; 2]);
    assert_eq!(names(&font, 17), ["Light"; 2]);
    assert!(names(&font, 6).iter().all(|s| s == "FixtureSans-Light"));
    assert_eq!(font.os2().unwrap().us_weight_class(), 300);
    assert!(font.os2().unwrap().fs_selection().contains(read_fonts::tables::os2::SelectionFlags::REGULAR));
    assert!(font.head().unwrap().mac_style().is_empty());
}

#[test]
fn whole_file_checksum() {
    let output = at(700.0);
    let sum = output
        .chunks(4)
        .map(|c| {
            let mut word = [0u8; 4];
            word[..c.len()].copy_from_slice(c);
            u32::from_be_bytes(word)
        })
        .fold(0u32, u32::wrapping_add);
    assert_eq!(sum, 0xB1B0_AFBA);
}

/// A region that ends before its peak, active only below the default.
const BROKEN_REGION: Region = (-1.0, -0.5, -0.8);

#[test]
fn broken_regions_only_fail_where_they_apply() {
    let input = Fixture::new()
        .hvar(common::hvar(
            &[MAIN_REGION, BROKEN_REGION],
            &[vec![0, 0], vec![80, 10], vec![0, 0]],
        ))
        .build();
    let font = VariableFont::load(&input).unwrap();
    let options = Options::default();

    let err = font
        .build(&InstanceRequest::at(vec![AxisLocation::new("wght", 250.0)]), &options)
        .unwrap_err();
    assert!(matches!(err, Error::Interpolation(InterpolationError::MalformedRegion { .. })));
    assert!(!err.is_fatal());

    let bold = font
        .build(&InstanceRequest::at(vec![AxisLocation::new("wght", 700.0)]), &options)
        .unwrap();
    let bold = serialize(&bold).unwrap();
    assert_eq!(advance(&FontRef::new(&bold).unwrap(), 1), 580);
    assert_eq!(bold, instantiate(&input, &[AxisLocation::new("wght", 700.0)]).unwrap());
}

#[test]
fn unknown_axes_are_rejected() {
    let err = instantiate(&fixture(), &[AxisLocation::new("wdth", 100.0)]).unwrap_err();
    assert!(matches!(err, Error::UnknownAxis(tag) if tag == Tag::new(b"wdth")));
}
