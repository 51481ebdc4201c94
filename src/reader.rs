use std::{
    collections::VecDeque,
    fs::File,
    io::{self, BufRead},
    path::Path,
};

use log::debug;

use crate::{Columns, Error, ErrorKind, Record, Result};

/// Delimiters tried by the sniffer, in order of preference.
const CANDIDATES: [char; 4] = [',', '\t', ';', '|'];
/// Number of data lines (after the header) sampled when sniffing.
const SNIFF_LINES: usize = 20;

/// A reader of per-residue prediction tables.
///
/// The header is read when the reader is constructed, so that the delimiter
/// and the residue/score/accession columns are known before the first record.
pub struct Reader<R> {
    rdr: io::BufReader<R>,
    line: u64,
    delimiter: char,
    columns: Columns,
    // lines read ahead while sniffing, with their line numbers
    pending: VecDeque<(u64, String)>,
}

impl Reader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> Result<Reader<File>> {
        Reader::new(File::open(path)?, delimiter)
    }
}

impl<R: io::Read> Reader<R> {
    pub fn from_reader(rdr: R, delimiter: Option<char>) -> Result<Reader<R>> {
        Reader::new(rdr, delimiter)
    }

    /// Read the header from `rdr`. If `delimiter` is `None` it is detected
    /// from the header and the first few data lines.
    pub fn new(rdr: R, delimiter: Option<char>) -> Result<Reader<R>> {
        let mut rdr = io::BufReader::new(rdr);
        let mut line = 0;

        let header = match next_line(&mut rdr, &mut line)? {
            Some((_, header)) => header,
            None => {
                return Err(Error::new(ErrorKind::Parser(
                    "input is empty, expected a header line".into(),
                )))
            }
        };

        let mut pending = VecDeque::new();
        let delimiter = match delimiter {
            Some(d) => d,
            None => {
                while pending.len() < SNIFF_LINES {
                    match next_line(&mut rdr, &mut line)? {
                        Some(l) => pending.push_back(l),
                        None => break,
                    }
                }
                let sample: Vec<&str> = std::iter::once(header.as_str())
                    .chain(pending.iter().map(|(_, l)| l.as_str()))
                    .collect();
                sniff_delimiter(&sample)?
            }
        };
        debug!("using delimiter {:?}", delimiter);

        let columns = Columns::detect(&split_fields(&header, delimiter))?;
        debug!(
            "detected columns: residue {:?}, score {:?}, accession {:?}",
            columns.residue_name(),
            columns.score_name(),
            columns.accession_name()
        );

        Ok(Reader {
            rdr,
            line,
            delimiter,
            columns,
            pending,
        })
    }

    /// The columns detected in the header.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// The field delimiter in use.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// A borrowed iterator over the records of a prediction table.
    pub fn records(&mut self) -> RecordsIter<'_, R> {
        RecordsIter::new(self)
    }

    /// An owned iterator over the records of a prediction table.
    pub fn into_records(self) -> RecordsIntoIter<R> {
        RecordsIntoIter::new(self)
    }

    /// Read a single record from an input reader.
    fn read_record(&mut self) -> Result<Option<Record>> {
        let (line_no, line) = match self.pending.pop_front() {
            Some(l) => l,
            None => match next_line(&mut self.rdr, &mut self.line)? {
                Some(l) => l,
                None => return Ok(None),
            },
        };

        parse_input_line(&line, self.delimiter, &self.columns)
            .map(Some)
            .map_err(|e| {
                Error::new(ErrorKind::ReadRecord(format!("at line {}, {}", line_no, e)))
            })
    }
}

/// Read the next non-blank line, with its trailing line ending removed.
fn next_line<B: BufRead>(rdr: &mut B, line: &mut u64) -> Result<Option<(u64, String)>> {
    let mut buf = String::new();
    loop {
        buf.clear();
        let bytes = rdr.read_line(&mut buf)?;
        if bytes == 0 {
            return Ok(None);
        }
        *line += 1;
        if buf.trim().is_empty() {
            continue;
        }
        let trimmed = buf.trim_end_matches(&['\r', '\n'][..]);
        // a byte order mark would otherwise end up in the first column name
        let trimmed = trimmed.strip_prefix('\u{feff}').unwrap_or(trimmed);
        return Ok(Some((*line, trimmed.to_string())));
    }
}

fn parse_input_line(input: &str, delimiter: char, columns: &Columns) -> Result<Record> {
    let fields = split_fields(input, delimiter);
    if fields.len() != columns.names().len() {
        return Err(Error::new(ErrorKind::Parser(format!(
            "expected {} fields, found {}",
            columns.names().len(),
            fields.len()
        ))));
    }

    let residue_field = &fields[columns.residue()];
    let mut chars = residue_field.chars();
    let residue = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(Error::new(ErrorKind::Parser(format!(
                "residue must be a single character, found {:?}",
                residue_field
            ))))
        }
    };

    // an empty cell is a missing score, which never meets a threshold
    let score = match fields[columns.score()].as_str() {
        "" => f64::NAN,
        field => field.parse::<f64>()?,
    };
    let accession = columns.accession().map(|i| fields[i].clone());

    Ok(Record {
        accession,
        residue,
        score,
    })
}

/// Split a line on `delimiter`, honouring double quotes. Fields are trimmed.
pub(crate) fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            c => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Count occurrences of `delimiter` outside double quotes.
fn count_delimiter(line: &str, delimiter: char) -> usize {
    let mut in_quotes = false;
    let mut n = 0;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            n += 1;
        }
    }
    n
}

/// Guess the field delimiter of a table from a sample of its lines, the
/// header first.
///
/// A delimiter occurring the same (nonzero) number of times on every line is
/// preferred. Failing that, the delimiter seen most often in the header is
/// used.
pub fn sniff_delimiter(sample: &[&str]) -> Result<char> {
    let header = match sample.first() {
        Some(h) => *h,
        None => {
            return Err(Error::new(ErrorKind::Delimiter(
                "no lines to sniff".into(),
            )))
        }
    };

    for &d in &CANDIDATES {
        let n = count_delimiter(header, d);
        if n > 0 && sample.iter().all(|l| count_delimiter(l, d) == n) {
            return Ok(d);
        }
    }

    // keep the earliest candidate on ties
    let mut best: Option<(char, usize)> = None;
    for &d in &CANDIDATES {
        let n = count_delimiter(header, d);
        if n > 0 && best.map_or(true, |(_, m)| n > m) {
            best = Some((d, n));
        }
    }

    best.map(|(d, _)| d).ok_or_else(|| {
        Error::new(ErrorKind::Delimiter(format!(
            "none of {:?} found in header {:?}",
            CANDIDATES, header
        )))
    })
}

/// A borrowed iterator over the records of a prediction table.
pub struct RecordsIter<'r, R: 'r> {
    /// The underlying reader
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> RecordsIter<'r, R> {
    fn new(rdr: &'r mut Reader<R>) -> RecordsIter<'r, R> {
        RecordsIter { rdr }
    }
}

impl<'r, R: io::Read> Iterator for RecordsIter<'r, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        self.rdr.read_record().transpose()
    }
}

/// An owned iterator over the records of a prediction table.
pub struct RecordsIntoIter<R> {
    /// The underlying reader.
    rdr: Reader<R>,
}

impl<R: io::Read> RecordsIntoIter<R> {
    fn new(rdr: Reader<R>) -> RecordsIntoIter<R> {
        RecordsIntoIter { rdr }
    }
}

impl<R: io::Read> Iterator for RecordsIntoIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        self.rdr.read_record().transpose()
    }
}
