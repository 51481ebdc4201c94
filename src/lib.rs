//! Extract linear B-cell epitopes from per-residue prediction tables.
//!
//! Predictors such as BepiPred write one row per residue with a linear
//! epitope score. This crate reads such a table, groups residues by protein
//! accession and reports every maximal run of residues scoring at or above a
//! threshold as an [`Epitope`].
//!
//! ```
//! use epispan::{Extractor, Reader};
//!
//! let table = "Accession\tResidue\tBepiPred-3.0 linear epitope score\n\
//!              P1\tA\t0.05\nP1\tC\t0.20\nP1\tD\t0.30\nP1\tE\t0.05\nP1\tF\t0.90\n";
//!
//! let reader = Reader::new(table.as_bytes(), None).unwrap();
//! let epitopes = epispan::extract_epitopes(reader, &Extractor::default()).unwrap();
//!
//! assert_eq!(epitopes.len(), 2);
//! assert_eq!(epitopes[0].sequence, "CD");
//! assert_eq!((epitopes[0].start, epitopes[0].end), (2, 3));
//! ```

use std::io;

mod columns;
mod error;
mod extract;
mod reader;
mod record;
mod writer;

pub use columns::Columns;
pub use error::{Error, ErrorKind, Result};
pub use extract::{
    group_records, round_score, Extractor, Group, DEFAULT_THRESHOLD, UNKNOWN_ACCESSION,
};
pub use reader::{sniff_delimiter, Reader, RecordsIntoIter, RecordsIter};
pub use record::{Epitope, Record};
pub use writer::{format_score, Writer, HEADER};

/// Read every record from `reader`, group by accession and extract the
/// epitopes of each group.
pub fn extract_epitopes<R: io::Read>(reader: Reader<R>, extractor: &Extractor) -> Result<Vec<Epitope>> {
    let groups = group_records(reader.into_records())?;
    Ok(extractor.extract_groups(&groups))
}
