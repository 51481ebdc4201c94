use crate::{Error, ErrorKind, Result};

/// The columns of a prediction table that carry residues, scores and
/// (optionally) accessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    names: Vec<String>,
    residue: usize,
    score: usize,
    accession: Option<usize>,
}

impl Columns {
    /// Identify the residue, score and accession columns from header names.
    ///
    /// A residue column contains `Residue`, a score column contains `linear`
    /// and, ignoring case, `score`. An accession column contains `Accession`.
    /// If more than one column matches, the last one is used.
    pub fn detect<S: AsRef<str>>(names: &[S]) -> Result<Columns> {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().trim().to_string()).collect();

        let mut residue = None;
        let mut score = None;
        let mut accession = None;

        for (i, name) in names.iter().enumerate() {
            if name.contains("Residue") {
                residue = Some(i);
            }
            if name.contains("linear") && name.to_lowercase().contains("score") {
                score = Some(i);
            }
            if name.contains("Accession") {
                accession = Some(i);
            }
        }

        match (residue, score) {
            (Some(residue), Some(score)) => Ok(Columns {
                names,
                residue,
                score,
                accession,
            }),
            _ => Err(Error::new(ErrorKind::Columns(format!(
                "could not find residue/score columns, found columns: {:?}",
                names
            )))),
        }
    }

    /// All header names, trimmed.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn residue(&self) -> usize {
        self.residue
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn accession(&self) -> Option<usize> {
        self.accession
    }

    pub fn residue_name(&self) -> &str {
        &self.names[self.residue]
    }

    pub fn score_name(&self) -> &str {
        &self.names[self.score]
    }

    pub fn accession_name(&self) -> Option<&str> {
        self.accession.map(|i| self.names[i].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bepipred_header() {
        let cols = Columns::detect(&[
            "Accession",
            " Residue",
            "BepiPred-3.0 score",
            "BepiPred-3.0 linear epitope score ",
        ])
        .unwrap();
        assert_eq!(cols.residue(), 1);
        assert_eq!(cols.score(), 3);
        assert_eq!(cols.accession(), Some(0));
        assert_eq!(cols.residue_name(), "Residue");
        assert_eq!(cols.score_name(), "BepiPred-3.0 linear epitope score");
    }

    #[test]
    fn score_match_ignores_case_of_score_only() {
        let cols = Columns::detect(&["Residue", "linear SCORE"]).unwrap();
        assert_eq!(cols.score(), 1);
        assert_eq!(cols.accession_name(), None);

        // `linear` itself is case sensitive
        assert!(Columns::detect(&["Residue", "Linear score"]).is_err());
    }

    #[test]
    fn last_match_wins() {
        let cols = Columns::detect(&["Residue", "linear score", "Residue name", "linear score 2"])
            .unwrap();
        assert_eq!(cols.residue(), 2);
        assert_eq!(cols.score(), 3);
    }

    #[test]
    fn missing_columns_is_an_error() {
        let err = Columns::detect(&["Accession", "Residue", "score"]).unwrap_err();
        match err.kind() {
            ErrorKind::Columns(msg) => assert!(msg.contains("\"score\"")),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
