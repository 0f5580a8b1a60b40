//! # Font Instancer
//!
//! Split TrueType variable fonts into static instances.
//!
//! A [`VariableFont`] is loaded once and shared by every instance built from
//! it. Each instance interpolates the glyph outlines, advance widths and
//! font-wide metrics at one design-space location, drops the variation
//! tables and copies everything else through.
//!
//! ## Example
//!
//! ```no_run
//! use font_instancer::{AxisLocation, instantiate};
//!
//! let font = std::fs::read("Family[wght,wdth].ttf").unwrap();
//! let location = [AxisLocation::from(("wght", 700.0)), AxisLocation::from(("wdth", 75.0))];
//! let bold_condensed = instantiate(&font, &location).unwrap();
//! std::fs::write("Family-BoldCondensed.ttf", bold_condensed).unwrap();
//! ```
//!
//! Every named instance at once:
//!
//! ```no_run
//! use font_instancer::{Options, Selection, run};
//!
//! let font = std::fs::read("Family[wght].ttf").unwrap();
//! let report = run(&font, &Selection::NamedInstances, &Options::default()).unwrap();
//! for instance in report.built() {
//!     std::fs::write(&instance.file_name, instance.data().unwrap()).unwrap();
//! }
//! ```

mod container;
mod error;
mod font;
mod glyphs;
mod instance;
mod interpolate;
mod iup;
mod location;
mod metrics;
mod names;
mod naming;
mod options;
mod registry;
mod serialize;
mod split;
mod store;
mod tables;

pub use container::{Flavor, FontContainer, TableRecord};
pub use error::{Error, FormatError, InterpolationError, Result, SerializationError};
pub use font::VariableFont;
pub use glyphs::GlyphSet;
pub use instance::{InstanceRequest, StaticFontInstance, build};
pub use interpolate::{Delta, Interpolator, Quantity, ot_round, region_scalar, support};
pub use location::{NormalizedCoordinate, ResolvedLocation};
pub use naming::{InstanceNames, Style};
pub use options::Options;
pub use registry::{Axis, NamedInstance, extract_axes, extract_named_instances, location_label};
pub use serialize::serialize;
pub use split::{InstanceReport, Outcome, RunReport, Selection, plan, run, run_font, sanitize_file_name};
pub use store::VariationStore;
pub use tables::{Disposition, TableKind};

use read_fonts::types::Tag;

/// One axis value of a requested location, in user units (`wght=700`,
/// not the normalized `0.6`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLocation {
    pub tag: Tag,
    pub value: f32,
}

impl AxisLocation {
    /// Tags shorter than four bytes are padded with spaces.
    ///
    /// ```
    /// use font_instancer::AxisLocation;
    /// assert_eq!(AxisLocation::new("wght", 700.0).tag.to_string(), "wght");
    /// ```
    pub fn new(tag: &str, value: f32) -> Self {
        let mut padded = [b' '; 4];
        padded.iter_mut().zip(tag.bytes()).for_each(|(dst, src)| *dst = src);
        Self { tag: Tag::new(&padded), value }
    }

    /// Parse `TAG=VALUE`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (tag, value) = spec.split_once('=')?;
        let tag = tag.trim();
        if tag.is_empty() || tag.len() > 4 || !tag.is_ascii() {
            return None;
        }
        let value: f32 = value.trim().parse().ok()?;
        value.is_finite().then(|| Self::new(tag, value))
    }
}

impl From<(&str, f32)> for AxisLocation {
    fn from((tag, value): (&str, f32)) -> Self {
        Self::new(tag, value)
    }
}

impl From<(Tag, f32)> for AxisLocation {
    fn from((tag, value): (Tag, f32)) -> Self {
        Self { tag, value }
    }
}

/// Build one static font at `locations` with default [`Options`].
///
/// Axes that are not mentioned stay at their default. A location that lands
/// on a named instance is named after it.
pub fn instantiate(data: &[u8], locations: &[AxisLocation]) -> Result<Vec<u8>> {
    let font = VariableFont::load(data)?;
    let request = plan(&font, &Selection::Location(locations.to_vec()))
        .pop()
        .unwrap_or_else(|| InstanceRequest::at(locations.to_vec()));
    let instance = font.build(&request, &Options::default())?;
    Ok(serialize(&instance)?)
}
