/// One row of a per-residue prediction table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The protein accession, if the table has an accession column
    pub accession: Option<String>,
    /// The amino acid at this position
    pub residue: char,
    /// Linear epitope score
    pub score: f64,
}

/// A maximal run of residues scoring at or above the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Epitope {
    /// Accession of the protein the run was found in
    pub accession: String,
    /// The residues of the run, in order
    pub sequence: String,
    /// 1-based start position, inclusive
    pub start: usize,
    /// 1-based end position, inclusive
    pub end: usize,
    /// Mean score over the run, rounded to 6 decimal places
    pub mean_score: f64,
}

impl Epitope {
    /// Number of residues in the epitope.
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}
