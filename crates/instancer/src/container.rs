//! The sfnt table directory.
//!
//! [`FontContainer`] validates the directory of a single font file up front
//! and then hands out table payloads by tag. Typed views come from
//! `read-fonts` through the [`TableProvider`] implementation, so the rest of
//! the crate never touches raw offsets.

use std::fmt;

use log::debug;
use read_fonts::{FontData, TableProvider, types::Tag};

use crate::error::FormatError;

const HEADER_LEN: usize = 12;
const RECORD_LEN: usize = 16;

const TTCF: u32 = u32::from_be_bytes(*b"ttcf");
const WOFF: u32 = u32::from_be_bytes(*b"wOFF");
const WOFF2: u32 = u32::from_be_bytes(*b"wOF2");

/// The outline flavor recorded in the sfnt header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// `0x00010000`
    TrueType,
    /// `true`, used by some older Apple fonts.
    AppleTrueType,
    /// `OTTO`
    Cff,
}

impl Flavor {
    fn from_version(version: u32) -> Result<Self, FormatError> {
        match version {
            0x0001_0000 => Ok(Flavor::TrueType),
            0x7472_7565 => Ok(Flavor::AppleTrueType),
            0x4F54_544F => Ok(Flavor::Cff),
            TTCF | WOFF | WOFF2 => Err(FormatError::UnsupportedFlavor(Tag::from_u32(version))),
            other => Err(FormatError::BadMagic(other)),
        }
    }

    /// The sfnt version to write back into a header.
    pub fn sfnt_version(self) -> u32 {
        match self {
            Flavor::TrueType => 0x0001_0000,
            Flavor::AppleTrueType => 0x7472_7565,
            Flavor::Cff => 0x4F54_544F,
        }
    }

    /// Conventional file extension for this flavor.
    pub fn extension(self) -> &'static str {
        match self {
            Flavor::TrueType | Flavor::AppleTrueType => "ttf",
            Flavor::Cff => "otf",
        }
    }
}

/// One entry of the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.length as usize
    }
}

/// A validated view over the tables of one font file.
#[derive(Clone)]
pub struct FontContainer<'a> {
    data: &'a [u8],
    flavor: Flavor,
    records: Vec<TableRecord>,
}

impl<'a> FontContainer<'a> {
    /// Parse and validate the table directory.
    ///
    /// Every record must point inside the file, no tag may repeat and no two
    /// non-empty tables may share bytes. Table checksums are not verified:
    /// plenty of shipping fonts get them wrong and the payloads are rewritten
    /// or checksummed again on output anyway.
    pub fn parse(data: &'a [u8]) -> Result<Self, FormatError> {
        let font_data = FontData::new(data);
        if data.len() < HEADER_LEN {
            return Err(FormatError::Truncated("sfnt header"));
        }
        let version: u32 = font_data.read_at(0)?;
        let flavor = Flavor::from_version(version)?;
        let num_tables: u16 = font_data.read_at(4)?;

        let directory_end = HEADER_LEN + RECORD_LEN * num_tables as usize;
        if data.len() < directory_end {
            return Err(FormatError::Truncated("table directory"));
        }

        let mut records = Vec::with_capacity(num_tables as usize);
        for i in 0..num_tables as usize {
            let base = HEADER_LEN + i * RECORD_LEN;
            let record = TableRecord {
                tag: font_data.read_at(base)?,
                checksum: font_data.read_at(base + 4)?,
                offset: font_data.read_at(base + 8)?,
                length: font_data.read_at(base + 12)?,
            };
            let end = u64::from(record.offset) + u64::from(record.length);
            if end > data.len() as u64 {
                return Err(FormatError::TableOutOfBounds {
                    tag: record.tag,
                    offset: record.offset,
                    length: record.length,
                });
            }
            if records.iter().any(|r: &TableRecord| r.tag == record.tag) {
                return Err(FormatError::DuplicateTable(record.tag));
            }
            records.push(record);
        }

        check_overlaps(&records, directory_end)?;
        records.sort_by_key(|r| r.tag);
        debug!("parsed {} tables ({flavor:?})", records.len());

        Ok(Self { data, flavor, records })
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// The whole input file.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Payload of the table with the given tag.
    pub fn table(&self, tag: Tag) -> Option<&'a [u8]> {
        let record = self.records.iter().find(|r| r.tag == tag)?;
        self.data.get(record.range())
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.records.iter().any(|r| r.tag == tag)
    }

    /// Table tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.records.iter().map(|r| r.tag)
    }

    pub fn records(&self) -> &[TableRecord] {
        &self.records
    }

    /// Like [`FontContainer::table`], but a missing table is an error.
    pub fn require(&self, tag: Tag) -> Result<&'a [u8], FormatError> {
        self.table(tag).ok_or(FormatError::MissingTable(tag))
    }
}

impl fmt::Debug for FontContainer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontContainer")
            .field("flavor", &self.flavor)
            .field("tables", &self.records.iter().map(|r| r.tag).collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> TableProvider<'a> for FontContainer<'a> {
    fn data_for_tag(&self, tag: Tag) -> Option<FontData<'a>> {
        self.table(tag).map(FontData::new)
    }
}

/// Non-empty tables may share bytes neither with each other nor with the
/// header and directory, which end at `directory_end`.
fn check_overlaps(records: &[TableRecord], directory_end: usize) -> Result<(), FormatError> {
    let mut by_offset: Vec<&TableRecord> = records.iter().filter(|r| r.length > 0).collect();
    by_offset.sort_by_key(|r| r.offset);
    if let Some(first) = by_offset.first()
        && (first.offset as usize) < directory_end
    {
        return Err(FormatError::OverlapsDirectory(first.tag));
    }
    for pair in by_offset.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if u64::from(prev.offset) + u64::from(prev.length) > u64::from(next.offset) {
            return Err(FormatError::OverlappingTables(prev.tag, next.tag));
        }
    }
    Ok(())
}
