//! Design-space axes and named instances declared by `fvar`.

use indexmap::IndexMap;
use read_fonts::{
    TableProvider,
    types::{NameId, Tag},
};

use crate::{
    container::FontContainer,
    error::{Error, FormatError, Result},
    names::NameLookup,
};

const FVAR: Tag = Tag::new(b"fvar");
const HIDDEN_AXIS: u16 = 0x0001;

/// One design-space axis, in user units.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub tag: Tag,
    pub min: f32,
    pub default: f32,
    pub max: f32,
    /// Display name from the `name` table, or the tag when there is none.
    pub name: String,
    pub name_id: NameId,
    pub hidden: bool,
}

impl Axis {
    /// Clamp a user value into the declared range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// A preset coordinate declared by the font.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedInstance {
    /// Subfamily name, e.g. `Bold`.
    pub name: String,
    pub postscript_name: Option<String>,
    /// User value for every axis, in axis order.
    pub coordinate: IndexMap<Tag, f32>,
}

/// Read the axes from `fvar`.
///
/// # Errors
///
/// - [`Error::MissingAxisData`] if the font has no `fvar` table
/// - [`FormatError::InvalidAxis`] if an axis does not satisfy
///   `min <= default <= max`
pub fn extract_axes(font: &FontContainer) -> Result<Vec<Axis>> {
    if !font.contains(FVAR) {
        return Err(Error::MissingAxisData);
    }
    let fvar = font.fvar()?;
    let names = NameLookup::new(font);

    fvar.axis_instance_arrays()?
        .axes()
        .iter()
        .map(|record| {
            let tag = record.axis_tag();
            let min = record.min_value().to_f64() as f32;
            let default = record.default_value().to_f64() as f32;
            let max = record.max_value().to_f64() as f32;
            if !(min <= default && default <= max) {
                return Err(FormatError::InvalidAxis { tag, min, default, max }.into());
            }
            let name_id = record.axis_name_id();
            Ok(Axis {
                tag,
                min,
                default,
                max,
                name: names.first_decoded(name_id).unwrap_or_else(|| tag.to_string()),
                name_id,
                hidden: record.flags() & HIDDEN_AXIS != 0,
            })
        })
        .collect()
}

/// Read the named instances from `fvar`.
///
/// Coordinates outside an axis range are clamped. An instance without a
/// decodable subfamily name is labelled by its coordinate.
pub fn extract_named_instances(font: &FontContainer, axes: &[Axis]) -> Result<Vec<NamedInstance>> {
    if !font.contains(FVAR) {
        return Err(Error::MissingAxisData);
    }
    let fvar = font.fvar()?;
    let names = NameLookup::new(font);

    let mut instances = Vec::new();
    for record in fvar.axis_instance_arrays()?.instances().iter() {
        let record = record?;
        let coordinate: IndexMap<Tag, f32> = axes
            .iter()
            .enumerate()
            .map(|(i, axis)| {
                let value = record
                    .coordinates
                    .get(i)
                    .map(|v| v.get().to_f64() as f32)
                    .unwrap_or(axis.default);
                (axis.tag, axis.clamp(value))
            })
            .collect();

        let name = names
            .first_decoded(record.subfamily_name_id)
            .unwrap_or_else(|| location_label(coordinate.iter().map(|(t, v)| (*t, *v))));
        let postscript_name = record
            .post_script_name_id
            .and_then(|id| names.first_decoded(id));

        instances.push(NamedInstance { name, postscript_name, coordinate });
    }
    Ok(instances)
}

/// A compact label for a coordinate, e.g. `wght700 wdth87.5`.
pub fn location_label(values: impl IntoIterator<Item = (Tag, f32)>) -> String {
    let label = values
        .into_iter()
        .map(|(tag, value)| format!("{}{value}", tag.to_string().trim_end()))
        .collect::<Vec<_>>()
        .join(" ");
    if label.is_empty() { "Default".to_string() } else { label }
}
