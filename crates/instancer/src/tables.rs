//! What happens to each table when a static instance is built.

use read_fonts::types::Tag;

/// Tables the instancer knows by name. Everything else is [`TableKind::Other`]
/// and is copied through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Head,
    Hhea,
    Hmtx,
    Maxp,
    Glyf,
    Loca,
    Name,
    Os2,
    Post,
    Fvar,
    Gvar,
    Avar,
    Cvar,
    Hvar,
    Mvar,
    Vvar,
    Stat,
    Dsig,
    Other(Tag),
}

/// How a table reaches the static font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A new payload is computed for every instance.
    Rebuild,
    /// The table has no meaning in a static font.
    Drop,
    /// The input bytes are copied verbatim.
    PassThrough,
}

impl TableKind {
    pub fn from_tag(tag: Tag) -> Self {
        match &tag.to_be_bytes() {
            b"head" => TableKind::Head,
            b"hhea" => TableKind::Hhea,
            b"hmtx" => TableKind::Hmtx,
            b"maxp" => TableKind::Maxp,
            b"glyf" => TableKind::Glyf,
            b"loca" => TableKind::Loca,
            b"name" => TableKind::Name,
            b"OS/2" => TableKind::Os2,
            b"post" => TableKind::Post,
            b"fvar" => TableKind::Fvar,
            b"gvar" => TableKind::Gvar,
            b"avar" => TableKind::Avar,
            b"cvar" => TableKind::Cvar,
            b"HVAR" => TableKind::Hvar,
            b"MVAR" => TableKind::Mvar,
            b"VVAR" => TableKind::Vvar,
            b"STAT" => TableKind::Stat,
            b"DSIG" => TableKind::Dsig,
            _ => TableKind::Other(tag),
        }
    }

    pub fn tag(self) -> Tag {
        match self {
            TableKind::Head => Tag::new(b"head"),
            TableKind::Hhea => Tag::new(b"hhea"),
            TableKind::Hmtx => Tag::new(b"hmtx"),
            TableKind::Maxp => Tag::new(b"maxp"),
            TableKind::Glyf => Tag::new(b"glyf"),
            TableKind::Loca => Tag::new(b"loca"),
            TableKind::Name => Tag::new(b"name"),
            TableKind::Os2 => Tag::new(b"OS/2"),
            TableKind::Post => Tag::new(b"post"),
            TableKind::Fvar => Tag::new(b"fvar"),
            TableKind::Gvar => Tag::new(b"gvar"),
            TableKind::Avar => Tag::new(b"avar"),
            TableKind::Cvar => Tag::new(b"cvar"),
            TableKind::Hvar => Tag::new(b"HVAR"),
            TableKind::Mvar => Tag::new(b"MVAR"),
            TableKind::Vvar => Tag::new(b"VVAR"),
            TableKind::Stat => Tag::new(b"STAT"),
            TableKind::Dsig => Tag::new(b"DSIG"),
            TableKind::Other(tag) => tag,
        }
    }

    /// `name` is only rebuilt when instance names are requested; with name
    /// updates disabled it passes through like any unknown table.
    pub fn disposition(self, update_names: bool) -> Disposition {
        match self {
            TableKind::Head
            | TableKind::Hhea
            | TableKind::Hmtx
            | TableKind::Glyf
            | TableKind::Loca
            | TableKind::Os2
            | TableKind::Post => Disposition::Rebuild,
            TableKind::Name if update_names => Disposition::Rebuild,
            TableKind::Fvar
            | TableKind::Gvar
            | TableKind::Avar
            | TableKind::Cvar
            | TableKind::Hvar
            | TableKind::Mvar
            | TableKind::Vvar
            | TableKind::Stat
            | TableKind::Dsig => Disposition::Drop,
            TableKind::Name | TableKind::Maxp | TableKind::Other(_) => Disposition::PassThrough,
        }
    }
}

impl From<Tag> for TableKind {
    fn from(tag: Tag) -> Self {
        Self::from_tag(tag)
    }
}
