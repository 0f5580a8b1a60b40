use std::result;

use read_fonts::{ReadError, types::Tag};

/// Error types for the instancer.
///
/// `Format` and `MissingAxisData` are fatal for a whole run: nothing can be
/// built from the input. The other variants only fail the instance that
/// triggered them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed font: {0}")]
    Format(#[from] FormatError),

    #[error("not a variable font (no fvar table)")]
    MissingAxisData,

    #[error("interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("axis not found: {0}")]
    UnknownAxis(Tag),
}

impl Error {
    /// Whether this error aborts a run before any instance is attempted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Format(_) | Error::MissingAxisData)
    }
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        Error::Format(FormatError::Read(err))
    }
}

/// The input is not a font this crate can read.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FormatError {
    #[error("file is truncated ({0})")]
    Truncated(&'static str),

    #[error("unrecognized sfnt version 0x{0:08X}")]
    BadMagic(u32),

    #[error("unsupported container flavor '{0}'")]
    UnsupportedFlavor(Tag),

    #[error("table '{tag}' lies outside the file (offset {offset}, length {length})")]
    TableOutOfBounds { tag: Tag, offset: u32, length: u32 },

    #[error("tables '{0}' and '{1}' overlap")]
    OverlappingTables(Tag, Tag),

    #[error("table '{0}' overlaps the table directory")]
    OverlapsDirectory(Tag),

    #[error("duplicate table '{0}'")]
    DuplicateTable(Tag),

    #[error("required table '{0}' not found")]
    MissingTable(Tag),

    #[error("no glyf table (CFF/CFF2 outlines are not supported)")]
    UnsupportedOutlines,

    #[error("invalid axis '{tag}': min {min}, default {default}, max {max}")]
    InvalidAxis { tag: Tag, min: f32, default: f32, max: f32 },

    #[error("malformed '{tag}' table: {reason}")]
    Malformed { tag: Tag, reason: &'static str },

    #[error("failed to parse font: {0}")]
    Read(#[from] ReadError),
}

/// Variation data that cannot be evaluated at the requested location.
///
/// These are collected while loading the variation store and only raised by
/// builds whose location activates the offending data, so they need to be
/// cloneable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    #[error("{table}: region index {index} out of range ({count} regions)")]
    RegionOutOfRange { table: Tag, index: usize, count: usize },

    #[error("{table}: delta set {outer}/{inner} out of range")]
    DeltaSetOutOfRange { table: Tag, outer: u16, inner: u16 },

    #[error("glyph {glyph}: expected {expected} points, variation data addresses {actual}")]
    PointCountMismatch { glyph: u32, expected: usize, actual: usize },

    #[error("{table}: malformed region on axis {axis}")]
    MalformedRegion { table: Tag, axis: usize },

    #[error("{table}: variation data has {actual} axes, font has {expected}")]
    AxisCountMismatch { table: Tag, expected: usize, actual: usize },

    #[error("{table}: undecodable deltas for {target}")]
    MalformedDeltas { table: Tag, target: String },
}

/// A static table set that cannot be laid out as a font file.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SerializationError {
    #[error("failed to compile '{tag}': {reason}")]
    Compile { tag: Tag, reason: String },

    #[error("no tables to write")]
    Empty,

    #[error("missing or truncated head table")]
    MissingHead,

    #[error("too many tables ({0})")]
    TooManyTables(usize),

    #[error("font exceeds 4 GiB")]
    TooLarge,
}

pub type Result<T> = result::Result<T, Error>;
