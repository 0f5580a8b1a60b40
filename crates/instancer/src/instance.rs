//! Building the static table set for one location.

use std::collections::BTreeMap;

use log::debug;
use read_fonts::types::Tag;

use crate::{
    AxisLocation,
    container::Flavor,
    error::Result,
    font::VariableFont,
    glyphs::{GlyphSet, compiled},
    interpolate::Interpolator,
    metrics::{self, FontBounds, StyleAxes},
    naming::{InstanceNames, rebuild_name},
    options::Options,
    registry::{NamedInstance, location_label},
    tables::{Disposition, TableKind},
};

/// The tables of a static font, keyed by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFontInstance {
    flavor: Flavor,
    tables: BTreeMap<Tag, Vec<u8>>,
}

impl StaticFontInstance {
    pub fn new(flavor: Flavor) -> Self {
        Self { flavor, tables: BTreeMap::new() }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn tables(&self) -> &BTreeMap<Tag, Vec<u8>> {
        &self.tables
    }

    pub fn table(&self, tag: Tag) -> Option<&[u8]> {
        self.tables.get(&tag).map(Vec::as_slice)
    }

    pub fn insert(&mut self, tag: Tag, data: Vec<u8>) {
        self.tables.insert(tag, data);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// One location to build, with the names the instance should carry.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRequest {
    pub location: Vec<AxisLocation>,
    pub subfamily: String,
    pub postscript_name: Option<String>,
}

impl InstanceRequest {
    /// A request for an explicit location, named after the axes it
    /// mentions.
    pub fn at(location: Vec<AxisLocation>) -> Self {
        let subfamily = location_label(location.iter().map(|l| (l.tag, l.value)));
        Self { location, subfamily, postscript_name: None }
    }

    pub fn named(instance: &NamedInstance) -> Self {
        Self {
            location: instance
                .coordinate
                .iter()
                .map(|(tag, value)| AxisLocation { tag: *tag, value: *value })
                .collect(),
            subfamily: instance.name.clone(),
            postscript_name: instance.postscript_name.clone(),
        }
    }

    pub fn names(&self, family: &str) -> InstanceNames {
        InstanceNames::new(family, &self.subfamily, self.postscript_name.as_deref())
    }
}

/// Build the static tables for `request`.
///
/// Glyph outlines, metrics and (with [`Options::update_names`]) names are
/// recomputed, variation tables are dropped, and every other table is
/// copied as is. Any error leaves nothing behind.
pub fn build(font: &VariableFont, request: &InstanceRequest, options: &Options) -> Result<StaticFontInstance> {
    let container = font.container();
    let resolved = font.resolve(&request.location, options.warn_on_clamp)?;
    let interpolator = Interpolator::new(font.store(), &resolved.normalized);

    let glyphs = GlyphSet::instantiate(container, &interpolator)?;
    let mut glyph_tables = glyphs.compile()?;
    let bounds = FontBounds::measure(&glyphs);

    let names = request.names(font.family());
    let style = options.update_names.then(|| names.style());
    let style_axes = StyleAxes::from_location(
        font.axes().iter().map(|axis| axis.tag).zip(resolved.user.iter().copied()),
    );

    let mut instance = StaticFontInstance::new(container.flavor());
    for tag in container.tags() {
        let kind = TableKind::from_tag(tag);
        let data = match kind.disposition(options.update_names) {
            Disposition::Drop => {
                debug!("{}: dropping '{tag}'", request.subfamily);
                continue;
            }
            Disposition::PassThrough => container.table(tag).unwrap_or_default().to_vec(),
            Disposition::Rebuild => match kind {
                TableKind::Glyf => std::mem::take(&mut glyph_tables.glyf),
                TableKind::Loca => std::mem::take(&mut glyph_tables.loca),
                TableKind::Hmtx => compiled(tag, write_fonts::dump_table(&glyphs.hmtx()))?,
                TableKind::Head => metrics::head(container, &bounds, glyph_tables.loca_format, style)?,
                TableKind::Hhea => {
                    metrics::hhea(container, &bounds, glyphs.number_of_h_metrics(), &interpolator)?
                }
                TableKind::Os2 => metrics::os2(container, &interpolator, &style_axes, style)?,
                TableKind::Post => metrics::post(container, &interpolator, &style_axes)?,
                TableKind::Name => rebuild_name(container, &names)?,
                _ => container.table(tag).unwrap_or_default().to_vec(),
            },
        };
        instance.insert(tag, data);
    }

    debug!("{}: {} tables", request.subfamily, instance.len());
    Ok(instance)
}
