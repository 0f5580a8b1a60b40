//! Lookups into the `name` table.

use read_fonts::{
    TableProvider,
    tables::name::{Name, NameRecord},
    types::NameId,
};

use crate::container::FontContainer;

/// Platform preference when several records carry the same name id:
/// Windows, Unicode, Macintosh, ISO.
const PLATFORM_ORDER: [u16; 4] = [3, 0, 1, 2];

const FAMILY_FALLBACK: &str = "Unnamed";

/// Decoded access to the name records of one font.
#[derive(Clone)]
pub struct NameLookup<'a> {
    name: Option<Name<'a>>,
}

impl<'a> NameLookup<'a> {
    pub fn new(font: &FontContainer<'a>) -> Self {
        Self { name: font.name().ok() }
    }

    /// The first record for `id` that decodes to a non-empty string, in
    /// platform preference order with English records first.
    pub fn first_decoded(&self, id: NameId) -> Option<String> {
        let name = self.name.as_ref()?;
        let mut records: Vec<&NameRecord> =
            name.name_record().iter().filter(|r| r.name_id() == id).collect();
        records.sort_by_key(|r| sort_key(r));

        records.into_iter().find_map(|record| {
            let decoded: String = record.string(name.string_data()).ok()?.chars().collect();
            let decoded = decoded.trim();
            (!decoded.is_empty()).then(|| decoded.to_string())
        })
    }

    /// Typographic family name, falling back to the legacy family name, then
    /// the PostScript name.
    pub fn family_name(&self) -> String {
        [NameId::TYPOGRAPHIC_FAMILY_NAME, NameId::FAMILY_NAME, NameId::POSTSCRIPT_NAME]
            .into_iter()
            .find_map(|id| self.first_decoded(id))
            .unwrap_or_else(|| FAMILY_FALLBACK.to_string())
    }
}

fn sort_key(record: &NameRecord) -> (usize, u16, bool, u16) {
    let platform = record.platform_id();
    let platform_rank = PLATFORM_ORDER
        .iter()
        .position(|p| *p == platform)
        .unwrap_or(PLATFORM_ORDER.len());
    let language = record.language_id();
    let english = matches!((platform, language), (1, 0) | (3, 0x409));
    (platform_rank, record.encoding_id(), !english, language)
}

/// Characters PostScript names may not contain.
const POSTSCRIPT_FORBIDDEN: &[char] = &['[', ']', '(', ')', '{', '}', '<', '>', '/', '%'];
const POSTSCRIPT_MAX_LEN: usize = 63;

/// `Family-Subfamily` with spaces removed, restricted to printable ASCII.
pub fn postscript_name(family: &str, subfamily: &str) -> String {
    let raw = format!("{}-{}", family.replace(' ', ""), subfamily.replace(' ', ""));
    sanitize_postscript(&raw)
}

/// Strip characters that are not allowed in a PostScript name and cap the
/// length.
pub fn sanitize_postscript(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_graphic() && !POSTSCRIPT_FORBIDDEN.contains(c))
        .take(POSTSCRIPT_MAX_LEN)
        .collect()
}
