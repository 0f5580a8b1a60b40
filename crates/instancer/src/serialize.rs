//! Writing a static table set as an sfnt file.

use read_fonts::{tables::compute_checksum, types::Tag};

use crate::{error::SerializationError, instance::StaticFontInstance};

const HEAD: Tag = Tag::new(b"head");
const HEADER_LEN: usize = 12;
const RECORD_LEN: usize = 16;
/// Offset of `checkSumAdjustment` inside `head`.
const CHECKSUM_ADJUSTMENT: usize = 8;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// `(searchRange, entrySelector, rangeShift)` for `num_tables` records.
fn search_params(num_tables: u16) -> (u16, u16, u16) {
    let entry_selector = if num_tables == 0 { 0 } else { num_tables.ilog2() as u16 };
    let search_range = (1u16 << entry_selector).saturating_mul(RECORD_LEN as u16);
    let range_shift = num_tables.saturating_mul(RECORD_LEN as u16).saturating_sub(search_range);
    (search_range, entry_selector, range_shift)
}

/// Lay out `instance` as a font file.
///
/// Tables are written in tag order, each padded to four bytes. The output
/// only depends on the table set, so equal instances give equal bytes.
pub fn serialize(instance: &StaticFontInstance) -> Result<Vec<u8>, SerializationError> {
    let tables = instance.tables();
    if tables.is_empty() {
        return Err(SerializationError::Empty);
    }
    match tables.get(&HEAD) {
        Some(head) if head.len() >= CHECKSUM_ADJUSTMENT + 4 => {}
        _ => return Err(SerializationError::MissingHead),
    }
    let num_tables =
        u16::try_from(tables.len()).map_err(|_| SerializationError::TooManyTables(tables.len()))?;

    let directory_len = HEADER_LEN + RECORD_LEN * tables.len();
    let total = tables
        .values()
        .fold(directory_len, |total, data| total + padded_len(data.len()));
    if u32::try_from(total).is_err() {
        return Err(SerializationError::TooLarge);
    }

    let mut out = Vec::with_capacity(total);
    let (search_range, entry_selector, range_shift) = search_params(num_tables);
    out.extend_from_slice(&instance.flavor().sfnt_version().to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut head_offset = 0;
    let mut offset = directory_len;
    let mut body = Vec::with_capacity(total - directory_len);
    for (tag, data) in tables {
        let mut padded = data.clone();
        padded.resize(padded_len(data.len()), 0);
        if *tag == HEAD {
            head_offset = offset;
            padded[CHECKSUM_ADJUSTMENT..CHECKSUM_ADJUSTMENT + 4].fill(0);
        }

        out.extend_from_slice(&tag.to_be_bytes());
        out.extend_from_slice(&compute_checksum(&padded).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());

        offset += padded.len();
        body.extend_from_slice(&padded);
    }
    out.extend_from_slice(&body);

    let adjustment = CHECKSUM_MAGIC.wrapping_sub(compute_checksum(&out));
    let at = head_offset + CHECKSUM_ADJUSTMENT;
    out[at..at + 4].copy_from_slice(&adjustment.to_be_bytes());
    Ok(out)
}
