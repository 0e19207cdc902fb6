//! Spectrum table writers.

use crate::Result;
use specpick_core::{Spectrum, COLUMN_NAMES};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output table formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    /// Astropy ECSV 1.0 (self-describing units).
    Ecsv,
    /// Plain comma-separated values with a header row.
    Csv,
}

impl TableFormat {
    /// Picks a format from the file extension; anything but `.csv` is ECSV.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => TableFormat::Csv,
            _ => TableFormat::Ecsv,
        }
    }
}

/// Writer for extracted spectra.
///
/// Each call writes one complete table; create a new writer per file.
pub struct SpectrumWriter<W: Write = BufWriter<File>> {
    writer: W,
}

impl SpectrumWriter {
    /// Creates (or truncates) the output file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl<W: Write> SpectrumWriter<W> {
    /// Wraps an arbitrary sink.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the spectrum as an ECSV 1.0 table.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_ecsv(&mut self, spectrum: &Spectrum) -> Result<()> {
        let units = [
            spectrum.observed.unit.symbol(),
            spectrum.rest.unit.symbol(),
            spectrum.flux_unit.symbol(),
            spectrum.flux_unit.symbol(),
        ];

        writeln!(self.writer, "# %ECSV 1.0")?;
        writeln!(self.writer, "# ---")?;
        writeln!(self.writer, "# datatype:")?;
        for (name, unit) in COLUMN_NAMES.iter().zip(units) {
            writeln!(
                self.writer,
                "# - {{name: {name}, unit: {unit}, datatype: float64}}"
            )?;
        }
        writeln!(self.writer, "# schema: astropy-2.0")?;
        writeln!(self.writer, "{}", COLUMN_NAMES.join(" "))?;

        self.write_rows(spectrum, ' ')
    }

    /// Writes the spectrum as CSV.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(&mut self, spectrum: &Spectrum) -> Result<()> {
        writeln!(self.writer, "{}", COLUMN_NAMES.join(","))?;
        self.write_rows(spectrum, ',')
    }

    fn write_rows(&mut self, spectrum: &Spectrum, sep: char) -> Result<()> {
        for row in spectrum.rows() {
            writeln!(
                self.writer,
                "{}{sep}{}{sep}{}{sep}{}",
                format_value(row.obswave),
                format_value(row.restwave),
                format_value(row.fnu),
                format_value(row.dfnu)
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Writes `spectrum` to `path`, choosing the format by extension.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_spectrum<P: AsRef<Path>>(path: P, spectrum: &Spectrum) -> Result<TableFormat> {
    let path = path.as_ref();
    let format = TableFormat::from_path(path);
    let mut writer = SpectrumWriter::create(path)?;
    match format {
        TableFormat::Ecsv => writer.write_ecsv(spectrum)?,
        TableFormat::Csv => writer.write_csv(spectrum)?,
    }
    log::info!("wrote {} rows to {}", spectrum.len(), path.display());
    Ok(format)
}

/// Shortest round-trip text, with exponent notation for very small or large
/// magnitudes.
fn format_value(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        let text = if v.is_sign_positive() { "inf" } else { "-inf" };
        text.to_string()
    } else if v == 0.0 || (1e-4..1e16).contains(&v.abs()) {
        format!("{v}")
    } else {
        format!("{v:e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use specpick_core::{derive_wavelengths, FluxUnit, WavelengthUnit};
    use tempfile::NamedTempFile;

    fn spectrum() -> Spectrum {
        let transform = |p: f64| 1.0 + p;
        let axes = derive_wavelengths(
            &transform,
            3,
            1.0,
            WavelengthUnit::Meter,
            WavelengthUnit::Meter,
        );
        Spectrum::new(
            axes,
            array![1.5, f64::NAN, 2.5e-7],
            array![0.5, f64::INFINITY, 0.0],
            FluxUnit::MegaJansky,
        )
        .unwrap()
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(1.25), "1.25");
        assert_eq!(format_value(-3.0), "-3");
        assert_eq!(format_value(2.5e-7), "2.5e-7");
        assert_eq!(format_value(f64::NAN), "nan");
        assert_eq!(format_value(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_table_format_from_path() {
        assert_eq!(TableFormat::from_path(Path::new("out.csv")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("out.CSV")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("out.ecsv")), TableFormat::Ecsv);
        assert_eq!(TableFormat::from_path(Path::new("out")), TableFormat::Ecsv);
    }

    #[test]
    fn test_write_ecsv() {
        let mut writer = SpectrumWriter::new(Vec::new());
        writer.write_ecsv(&spectrum()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# %ECSV 1.0");
        assert_eq!(lines[3], "# - {name: obswave, unit: m, datatype: float64}");
        assert_eq!(lines[5], "# - {name: fnu, unit: MJy, datatype: float64}");
        assert_eq!(lines[8], "obswave restwave fnu dfnu");
        assert_eq!(lines[9], "1 0.5 1.5 0.5");
        assert_eq!(lines[10], "2 1 nan inf");
        assert_eq!(lines[11], "3 1.5 2.5e-7 0");
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn test_write_spectrum_csv_file() {
        let file = NamedTempFile::with_suffix(".csv").unwrap();
        let format = write_spectrum(file.path(), &spectrum()).unwrap();
        assert_eq!(format, TableFormat::Csv);

        let content = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("obswave,restwave,fnu,dfnu"));
        assert_eq!(lines.next(), Some("1,0.5,1.5,0.5"));
        assert_eq!(content.lines().count(), 4);
    }
}
