//! Instance names and the rebuilt `name` table.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use read_fonts::{
    TableProvider,
    tables::name::Encoding,
    types::{NameId, Tag},
};
use write_fonts::tables::name::{Name, NameRecord};

use crate::{
    container::FontContainer,
    error::Result,
    glyphs::compiled,
    names::{postscript_name, sanitize_postscript},
};

const NAME: Tag = Tag::new(b"name");
const MAC_PLATFORM: u16 = 1;
/// Language ids from here on refer to language-tag records.
const LANG_TAG_BASE: u16 = 0x8000;
/// Windows, Unicode BMP, English (United States).
const WINDOWS_ENGLISH: (u16, u16, u16) = (3, 1, 0x409);

/// RIBBI flags for `head.macStyle` and `OS/2.fsSelection`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
}

/// Family, subfamily and PostScript name of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceNames {
    pub family: String,
    pub subfamily: String,
    pub postscript: String,
}

impl InstanceNames {
    /// Names for `subfamily` of `family`. Without an explicit PostScript name
    /// one is derived from the other two.
    pub fn new(family: &str, subfamily: &str, postscript: Option<&str>) -> Self {
        let postscript = match postscript.map(sanitize_postscript) {
            Some(name) if !name.is_empty() => name,
            _ => postscript_name(family, subfamily),
        };
        Self { family: family.to_string(), subfamily: subfamily.to_string(), postscript }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.family, self.subfamily)
    }

    pub fn style(&self) -> Style {
        let (rest, italic) = split_italic(&self.subfamily);
        Style { bold: rest == "Bold", italic }
    }

    /// Name ids to write and name ids to delete.
    fn plan(&self) -> (BTreeMap<NameId, String>, Vec<NameId>) {
        let (rest, italic) = split_italic(&self.subfamily);
        let mut planned = BTreeMap::new();
        planned.insert(NameId::FULL_NAME, self.full_name());
        planned.insert(NameId::POSTSCRIPT_NAME, self.postscript.clone());

        if is_ribbi(rest) {
            let legacy = match (rest == "Bold", italic) {
                (true, true) => "Bold Italic",
                (true, false) => "Bold",
                (false, true) => "Italic",
                (false, false) => "Regular",
            };
            planned.insert(NameId::FAMILY_NAME, self.family.clone());
            planned.insert(NameId::SUBFAMILY_NAME, legacy.to_string());
            (planned, vec![NameId::TYPOGRAPHIC_FAMILY_NAME, NameId::TYPOGRAPHIC_SUBFAMILY_NAME])
        } else {
            let legacy = if italic { "Italic" } else { "Regular" };
            planned.insert(NameId::FAMILY_NAME, format!("{} {rest}", self.family));
            planned.insert(NameId::SUBFAMILY_NAME, legacy.to_string());
            planned.insert(NameId::TYPOGRAPHIC_FAMILY_NAME, self.family.clone());
            planned.insert(NameId::TYPOGRAPHIC_SUBFAMILY_NAME, self.subfamily.clone());
            (planned, Vec::new())
        }
    }
}

/// Split a trailing `Italic` off a subfamily name.
fn split_italic(subfamily: &str) -> (&str, bool) {
    let subfamily = subfamily.trim();
    match subfamily.strip_suffix("Italic") {
        Some(rest) => (rest.trim_end(), true),
        None => (subfamily, false),
    }
}

fn is_ribbi(rest: &str) -> bool {
    matches!(rest, "" | "Regular" | "Bold")
}

/// Rebuild the `name` table of `font` for an instance.
///
/// Records of the rewritten ids get the new strings on every platform, and
/// every platform/encoding/language that has a family name gets the ids it
/// was missing. Windows English always carries the full set. Macintosh records keep their old string when the new one is
/// not ASCII. Records that do not decode, or whose encoding cannot be
/// written back, are dropped.
pub fn rebuild_name(font: &FontContainer, names: &InstanceNames) -> Result<Vec<u8>> {
    let name = font.name()?;
    let (planned, removed) = names.plan();

    let mut records = Vec::new();
    let mut families = BTreeSet::new();
    for record in name.name_record() {
        let (platform, encoding, language) =
            (record.platform_id(), record.encoding_id(), record.language_id());
        if language >= LANG_TAG_BASE {
            debug!("dropping language-tag name record {}", record.name_id());
            continue;
        }
        let id = record.name_id();
        if removed.contains(&id) {
            continue;
        }
        if matches!(Encoding::new(platform, encoding), Encoding::Unknown) {
            debug!("dropping name record {id} with unsupported encoding {platform}/{encoding}");
            continue;
        }
        let Ok(old) = record.string(name.string_data()) else {
            debug!("dropping undecodable name record {id} ({platform}/{encoding}/{language})");
            continue;
        };
        if id == NameId::FAMILY_NAME {
            families.insert((platform, encoding, language));
        }
        let string = match planned.get(&id) {
            Some(new) if platform != MAC_PLATFORM || new.is_ascii() => new.clone(),
            _ => old.chars().collect(),
        };
        records.push(((platform, encoding, language, id), string));
    }
    families.insert(WINDOWS_ENGLISH);

    for &(platform, encoding, language) in &families {
        for (id, string) in &planned {
            let key = (platform, encoding, language, *id);
            if records.iter().any(|(k, _)| *k == key) {
                continue;
            }
            if platform == MAC_PLATFORM && !string.is_ascii() {
                continue;
            }
            records.push((key, string.clone()));
        }
    }

    records.sort_by(|a, b| a.0.cmp(&b.0));
    records.dedup_by(|a, b| a.0 == b.0);

    let records = records
        .into_iter()
        .map(|((platform, encoding, language, id), string)| {
            NameRecord::new(platform, encoding, language, id, string.into())
        })
        .collect();
    compiled(NAME, write_fonts::dump_table(&Name::new(records)))
}
