//! Rendering a [`Tally`] as a bill of materials.

use crate::{ReportError, Tally, TallyItem};
use palette::Srgb;
use serde::Serialize;
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

/// One row of the bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomRow {
    /// Palette entry id.
    pub id: String,
    /// Palette entry display name.
    pub name: String,
    /// Source color as upper case hex digits.
    pub rgb: String,
    /// Number of units.
    pub count: u64,
    /// Special attribute flag.
    pub is_trans: bool,
    /// 8-bit CIELAB encoding, space separated.
    pub lab_array: String,
    /// Normalized CIELAB, space separated.
    pub lab_array_norm: String,
    /// Source color as decimal channel values, space separated.
    pub rgb_array: String,
}

impl From<&TallyItem> for BomRow {
    fn from(item: &TallyItem) -> Self {
        let entry = &item.entry;
        Self {
            id: entry.id().to_owned(),
            name: entry.display_name().to_owned(),
            rgb: entry.hex(),
            count: item.count,
            is_trans: entry.is_special(),
            lab_array: entry.perceptual_color().to_string(),
            lab_array_norm: entry.perceptual_color_normalized().to_string(),
            rgb_array: {
                let Srgb { red, green, blue, .. } = entry.source_color();
                format!("{red} {green} {blue}")
            },
        }
    }
}

/// Renders `tally` as report rows, one per used palette entry, in tally order.
#[must_use]
pub fn render(tally: &Tally) -> Vec<BomRow> {
    tally.iter().map(BomRow::from).collect()
}

/// Writes `tally` as CSV with a header row to `writer`.
///
/// # Errors
/// Returns [`ReportError::Csv`] if writing fails.
pub fn write_csv(tally: &Tally, writer: impl io::Write) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(writer);
    let rows = render(tally);
    if rows.is_empty() {
        // serde-driven headers are only written with the first record
        writer.write_record(HEADER)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// The report columns, in order.
pub const HEADER: [&str; 8] = [
    "id",
    "name",
    "rgb",
    "count",
    "is_trans",
    "lab_array",
    "lab_array_norm",
    "rgb_array",
];

/// A destination for the report of each completed pass.
pub trait BomSink {
    /// Stores the report for `tally`, replacing any previous report.
    ///
    /// # Errors
    /// Returns a [`ReportError`] if the report could not be stored.
    fn write(&mut self, tally: &Tally) -> Result<(), ReportError>;
}

/// Writes the report as a CSV file.
///
/// The file is written to a temporary sibling and then renamed over `path`,
/// so a failed write leaves the previous report intact.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    /// The report path.
    path: PathBuf,
}

impl CsvFileSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The report path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The temporary file written before the rename.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BomSink for CsvFileSink {
    fn write(&mut self, tally: &Tally) -> Result<(), ReportError> {
        let temp = self.temp_path();
        let result = fs::File::create(&temp)
            .map_err(ReportError::from)
            .and_then(|file| write_csv(tally, io::BufWriter::new(file)))
            .and_then(|()| fs::rename(&temp, &self.path).map_err(ReportError::from));

        if result.is_err() {
            let _ = fs::remove_file(&temp);
        } else {
            log::info!("wrote {} report rows to {}", tally.len(), self.path.display());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::*, GridPlan, Quantizer, UnitMode};

    fn red_green_tally() -> Tally {
        let store = rg_palette();
        let source = image_from(3, 1, &[[0, 255, 0], [255, 0, 0], [0, 250, 0]]);
        let plan = GridPlan::compute(24.0, UnitMode::Fine, 3.0, 8.0);
        Quantizer::new(&store)
            .quantize(&source, &plan)
            .unwrap()
            .into_parts()
            .1
    }

    #[test]
    fn rows_follow_first_seen_order() {
        let rows = render(&red_green_tally());
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].id.as_str(), rows[0].count), ("G", 2));
        assert_eq!((rows[1].id.as_str(), rows[1].count), ("R", 1));
        assert_eq!(rows[1].rgb, "FF0000");
        assert_eq!(rows[1].name, "Red");
        assert_eq!(rows[1].rgb_array, "255 0 0");
        assert!(!rows[1].is_trans);
    }

    #[test]
    fn csv_has_header_and_one_line_per_entry() {
        let tally = red_green_tally();
        let mut buf = Vec::new();
        write_csv(&tally, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], HEADER.join(","));
        assert_eq!(lines.len(), 3);

        let green = tally.items()[0].entry.perceptual_color();
        assert!(lines[1].starts_with(&format!("G,Green,00FF00,2,false,{green},")));
        assert!(lines[1].ends_with(",0 255 0"));
        assert!(lines[2].ends_with(",255 0 0"));
    }

    #[test]
    fn empty_tally_writes_header_only() {
        let tally = Tally::new(2, crate::TallyMode::Exact);
        let mut buf = Vec::new();
        write_csv(&tally, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{}\n", HEADER.join(",")));
    }

    #[test]
    fn file_sink_replaces_previous_report() {
        let dir = std::env::temp_dir().join(format!("brickquant-report-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bom.csv");
        fs::write(&path, "stale contents\nmore stale\nand more\nand more\n").unwrap();

        let mut sink = CsvFileSink::new(&path);
        sink.write(&red_green_tally()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("id,name,rgb,count"));
        assert_eq!(text.lines().count(), 3);
        assert!(!sink.temp_path().exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
