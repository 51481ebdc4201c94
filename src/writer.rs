use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{Epitope, Result};

/// Column names of the epitope table.
pub const HEADER: [&str; 6] = ["Accession", "Epitope", "Start", "End", "Length", "Mean Score"];

/// Writes epitopes as CSV, one row per epitope.
pub struct Writer<W: Write> {
    wtr: BufWriter<W>,
    header_written: bool,
    rows: usize,
}

impl Writer<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        Ok(Writer::new(File::create(path)?))
    }
}

impl<W: Write> Writer<W> {
    pub fn new(wtr: W) -> Writer<W> {
        Writer {
            wtr: BufWriter::new(wtr),
            header_written: false,
            rows: 0,
        }
    }

    /// Number of epitope rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn write_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            self.write_row(&HEADER[..])?;
            self.header_written = true;
        }
        Ok(())
    }

    fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> io::Result<()> {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.wtr.write_all(b",")?;
            }
            write_field(&mut self.wtr, field.as_ref())?;
        }
        self.wtr.write_all(b"\n")
    }

    pub fn write_epitope(&mut self, epitope: &Epitope) -> Result<()> {
        self.write_header()?;
        let fields = [
            epitope.accession.clone(),
            epitope.sequence.clone(),
            epitope.start.to_string(),
            epitope.end.to_string(),
            epitope.len().to_string(),
            format_score(epitope.mean_score),
        ];
        self.write_row(&fields[..])?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, epitopes: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Epitope>,
    {
        for epitope in epitopes {
            self.write_epitope(epitope)?;
        }
        Ok(())
    }

    /// Flush buffered output. The header is written even if no epitope was.
    pub fn flush(&mut self) -> Result<()> {
        self.write_header()?;
        self.wtr.flush()?;
        Ok(())
    }
}

fn write_field<W: Write>(wtr: &mut W, field: &str) -> io::Result<()> {
    if field.contains(&[',', '"', '\r', '\n'][..]) {
        write!(wtr, "\"{}\"", field.replace('"', "\"\""))
    } else {
        wtr.write_all(field.as_bytes())
    }
}

/// Shortest representation that reads back as the same float, always with a
/// decimal point for finite values. Magnitudes below 1e-4 or from 1e16 up use
/// exponent notation with a signed two digit exponent (`5e-05`, `1e+16`).
pub fn format_score(score: f64) -> String {
    let magnitude = score.abs();
    if score.is_finite() && score != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        format_exponent(score)
    } else if score.is_finite() && score.fract() == 0.0 {
        format!("{:.1}", score)
    } else {
        score.to_string()
    }
}

fn format_exponent(score: f64) -> String {
    let s = format!("{:e}", score);
    if let Some((mantissa, exp)) = s.split_once('e') {
        if let Ok(exp) = exp.parse::<i32>() {
            let sign = if exp < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exp.abs());
        }
    }
    s
}
