//! The fixed set of candidate colors and their precomputed perceptual representations.

use crate::{EncodedLab, NormalizedLab, PaletteError};
use palette::Srgb;
use serde::Deserialize;
use std::{collections::HashSet, io};

/// A raw palette record, as supplied by the caller or read from a palette table.
///
/// Every field is optional here so that incomplete records can be reported
/// by [`PaletteStore::load`] instead of failing earlier during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaletteRecord {
    /// Stable identifier of the entry.
    #[serde(default)]
    pub id: Option<String>,
    /// Human-readable label.
    #[serde(default, rename = "name", alias = "display_name")]
    pub display_name: Option<String>,
    /// 6 hex digit sRGB color, optionally prefixed with `#`.
    #[serde(default)]
    pub rgb: Option<String>,
    /// Boolean-like special attribute (e.g. translucency).
    #[serde(default, rename = "is_trans", alias = "special")]
    pub special: Option<String>,
}

impl PaletteRecord {
    /// Creates a record with all fields present.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        rgb: impl Into<String>,
        special: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            display_name: Some(display_name.into()),
            rgb: Some(rgb.into()),
            special: Some(special.into()),
        }
    }
}

/// One candidate color of the palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    /// Stable identifier, unique within its palette.
    id: String,
    /// Human-readable label.
    display_name: String,
    /// The color in the native image encoding.
    source_color: Srgb<u8>,
    /// The color in the 8-bit CIELAB encoding.
    perceptual_color: EncodedLab,
    /// The normalized perceptual color used for distances.
    perceptual_color_normalized: NormalizedLab,
    /// Passthrough special attribute.
    is_special: bool,
}

impl PaletteEntry {
    /// Stable identifier of this entry.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The entry's color in sRGB.
    #[must_use]
    pub fn source_color(&self) -> Srgb<u8> {
        self.source_color
    }

    /// The entry's color in the 8-bit CIELAB encoding.
    #[must_use]
    pub fn perceptual_color(&self) -> EncodedLab {
        self.perceptual_color
    }

    /// The normalized form of [`PaletteEntry::perceptual_color`].
    #[must_use]
    pub fn perceptual_color_normalized(&self) -> NormalizedLab {
        self.perceptual_color_normalized
    }

    /// The special attribute flag.
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.is_special
    }

    /// The source color as upper case hex digits.
    #[must_use]
    pub fn hex(&self) -> String {
        let Srgb { red, green, blue, .. } = self.source_color;
        hex::encode_upper([red, green, blue])
    }
}

/// An immutable, ordered set of [`PaletteEntry`]s.
///
/// Entry order is load order and is significant: it decides ties during color matching.
/// A store is never mutated after [`PaletteStore::load`] returns; to use a different palette,
/// load a new store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaletteStore {
    /// The entries in load order.
    entries: Vec<PaletteEntry>,
}

impl PaletteStore {
    /// Builds a palette from an ordered sequence of records.
    ///
    /// # Errors
    /// Returns [`PaletteError::MissingField`], [`PaletteError::InvalidColor`], or
    /// [`PaletteError::InvalidFlag`] for a malformed record and [`PaletteError::DuplicateId`]
    /// if two records share an id. No partial palette is ever returned.
    pub fn load(records: impl IntoIterator<Item = PaletteRecord>) -> Result<Self, PaletteError> {
        let mut entries = Vec::new();
        let mut ids = HashSet::new();

        for (row, record) in records.into_iter().enumerate() {
            let entry = parse_record(row, record)?;
            if !ids.insert(entry.id.clone()) {
                return Err(PaletteError::DuplicateId { row, id: entry.id });
            }
            entries.push(entry);
        }

        log::debug!("loaded palette with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Reads a palette table in CSV format (with a header row) and loads it.
    ///
    /// See [`PaletteRecord`] for the recognized columns.
    ///
    /// # Errors
    /// Returns [`PaletteError::Table`] if the table cannot be read,
    /// otherwise the same errors as [`PaletteStore::load`].
    pub fn from_csv_reader(reader: impl io::Read) -> Result<Self, PaletteError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let records = reader
            .deserialize()
            .collect::<Result<Vec<PaletteRecord>, _>>()?;

        Self::load(records)
    }

    /// The entries in load order.
    #[must_use]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// The entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    /// Finds the entry with the given id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, PaletteEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a PaletteStore {
    type Item = &'a PaletteEntry;
    type IntoIter = std::slice::Iter<'a, PaletteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Returns the trimmed, non-empty value of a field or a [`PaletteError::MissingField`].
fn required(
    row: usize,
    field: &'static str,
    value: Option<String>,
) -> Result<String, PaletteError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(PaletteError::MissingField { row, field }),
    }
}

/// Decodes 6 hex digits, with an optional leading `#`, into an sRGB color.
fn parse_hex_color(text: &str) -> Option<Srgb<u8>> {
    let digits = text.strip_prefix('#').unwrap_or(text);
    let mut rgb = [0; 3];
    hex::decode_to_slice(digits, &mut rgb).ok()?;
    let [red, green, blue] = rgb;
    Some(Srgb::new(red, green, blue))
}

/// Parses a boolean-like flag.
fn parse_flag(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "yes" | "y" => Some(true),
        "f" | "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Validates a record and precomputes its perceptual colors.
fn parse_record(row: usize, record: PaletteRecord) -> Result<PaletteEntry, PaletteError> {
    let PaletteRecord { id, display_name, rgb, special } = record;

    let id = required(row, "id", id)?;
    let display_name = required(row, "name", display_name)?;
    let rgb = required(row, "rgb", rgb)?;
    let special = required(row, "is_trans", special)?;

    let source_color =
        parse_hex_color(&rgb).ok_or(PaletteError::InvalidColor { row, value: rgb })?;
    let is_special = parse_flag(&special).ok_or(PaletteError::InvalidFlag { row, value: special })?;

    let perceptual_color = EncodedLab::from_srgb(source_color);

    Ok(PaletteEntry {
        id,
        display_name,
        source_color,
        perceptual_color,
        perceptual_color_normalized: perceptual_color.normalize(),
        is_special,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_keeps_order_and_precomputes_colors() {
        let store = PaletteStore::load([
            PaletteRecord::new("15", "White", "FFFFFF", "f"),
            PaletteRecord::new("0", "Black", "#05131d", "f"),
            PaletteRecord::new("47", "Trans-Clear", "FCFCFC", "t"),
        ])
        .unwrap();

        let ids = store.iter().map(PaletteEntry::id).collect::<Vec<_>>();
        assert_eq!(ids, ["15", "0", "47"]);

        let white = &store.entries()[0];
        assert_eq!(white.source_color(), Srgb::new(255, 255, 255));
        assert_eq!(white.perceptual_color(), EncodedLab::new(255, 128, 128));
        assert_eq!(white.perceptual_color_normalized(), white.perceptual_color().normalize());
        assert!(!white.is_special());

        assert_eq!(store.find("0").unwrap().hex(), "05131D");
        assert!(store.find("47").unwrap().is_special());
        assert!(store.find("missing").is_none());
    }

    #[test]
    fn empty_input_gives_empty_store() {
        let store = PaletteStore::load(Vec::<PaletteRecord>::new()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let err = PaletteStore::load([
            PaletteRecord::new("4", "Red", "C91A09", "f"),
            PaletteRecord::new("4", "Trans-Red", "C91A09", "t"),
        ])
        .unwrap_err();

        assert!(matches!(err, PaletteError::DuplicateId { row: 1, ref id } if id == "4"));
        assert!(!err.is_malformed_record());
    }

    #[test]
    fn malformed_records_are_rejected() {
        let missing = PaletteRecord { rgb: None, ..PaletteRecord::new("1", "Blue", "", "f") };
        assert!(matches!(
            PaletteStore::load([missing]),
            Err(PaletteError::MissingField { row: 0, field: "rgb" })
        ));

        let blank_id = PaletteRecord::new("  ", "Blue", "0055BF", "f");
        assert!(matches!(
            PaletteStore::load([blank_id]),
            Err(PaletteError::MissingField { row: 0, field: "id" })
        ));

        for color in ["0055B", "0055BF00", "0055BG", "blue"] {
            let record = PaletteRecord::new("1", "Blue", color, "f");
            let err = PaletteStore::load([record]).unwrap_err();
            assert!(matches!(err, PaletteError::InvalidColor { .. }), "{color}");
            assert!(err.is_malformed_record());
        }

        let flag = PaletteRecord::new("1", "Blue", "0055BF", "maybe");
        assert!(matches!(
            PaletteStore::load([flag]),
            Err(PaletteError::InvalidFlag { row: 0, .. })
        ));
    }

    #[test]
    fn reads_csv_table() {
        let table = "\
id,name,rgb,is_trans
0,Black,05131D,f
36,Trans-Red,C91A09,t
";
        let store = PaletteStore::from_csv_reader(table.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[1].display_name(), "Trans-Red");
        assert!(store.entries()[1].is_special());
    }

    #[test]
    fn csv_accepts_alternate_headers() {
        let table = "\
id,display_name,rgb,special
R,Red,FF0000,false
";
        let store = PaletteStore::from_csv_reader(table.as_bytes()).unwrap();
        assert_eq!(store.entries()[0].display_name(), "Red");
    }

    #[test]
    fn csv_missing_column_is_a_missing_field() {
        let table = "\
id,name,rgb
0,Black,05131D
";
        assert!(matches!(
            PaletteStore::from_csv_reader(table.as_bytes()),
            Err(PaletteError::MissingField { row: 0, field: "is_trans" })
        ));
    }
}
