use std::{collections::BTreeMap, mem};

use log::{debug, warn};

use crate::{Epitope, Record, Result};

/// Score cutoff used when none is given.
pub const DEFAULT_THRESHOLD: f64 = 0.1512;
/// Accession label for rows from a table without an accession column.
pub const UNKNOWN_ACCESSION: &str = "unknown";

/// The residues and scores of one accession, in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub accession: String,
    pub residues: Vec<(char, f64)>,
}

/// Finds maximal runs of residues scoring at or above a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extractor {
    threshold: f64,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(DEFAULT_THRESHOLD)
    }
}

impl Extractor {
    pub fn new(threshold: f64) -> Extractor {
        Extractor { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Extract the epitopes of a single accession.
    ///
    /// Positions are 1-based. A residue belongs to a run when its score is
    /// `>= threshold`; NaN scores never do.
    pub fn extract<I>(&self, accession: &str, residues: I) -> Vec<Epitope>
    where
        I: IntoIterator<Item = (char, f64)>,
    {
        let mut epitopes = Vec::new();
        let mut run = Run::default();
        let mut last = 0;

        for (i, (residue, score)) in residues.into_iter().enumerate() {
            let pos = i + 1;
            last = pos;
            if score >= self.threshold {
                if run.is_empty() {
                    run.start = pos;
                }
                run.push(residue, score);
            } else if !run.is_empty() {
                epitopes.push(run.close(accession, pos - 1));
            }
        }

        if !run.is_empty() {
            epitopes.push(run.close(accession, last));
        }

        debug!(
            "{}: {} residues, {} epitopes",
            accession,
            last,
            epitopes.len()
        );
        epitopes
    }

    /// Extract the epitopes of every group, keeping group order.
    pub fn extract_groups<'a, I>(&self, groups: I) -> Vec<Epitope>
    where
        I: IntoIterator<Item = &'a Group>,
    {
        groups
            .into_iter()
            .flat_map(|g| self.extract(&g.accession, g.residues.iter().copied()))
            .collect()
    }
}

// the open run, reset every time it is closed
#[derive(Default)]
struct Run {
    start: usize,
    sequence: String,
    scores: Vec<f64>,
}

impl Run {
    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn push(&mut self, residue: char, score: f64) {
        self.sequence.push(residue);
        self.scores.push(score);
    }

    fn close(&mut self, accession: &str, end: usize) -> Epitope {
        let mean = self.scores.iter().sum::<f64>() / self.scores.len() as f64;
        self.scores.clear();
        Epitope {
            accession: accession.to_string(),
            sequence: mem::take(&mut self.sequence),
            start: self.start,
            end,
            mean_score: round_score(mean),
        }
    }
}

/// Round a score to 6 decimal places.
pub fn round_score(x: f64) -> f64 {
    format!("{:.6}", x).parse().unwrap_or(x)
}

/// Partition records into accession groups.
///
/// Groups come out in ascending accession order, numeric when every
/// accession is an integer, and residues keep their table order within a
/// group. Records without an accession column all go to
/// a single [`UNKNOWN_ACCESSION`] group. Records with an empty accession
/// field are skipped.
pub fn group_records<I>(records: I) -> Result<Vec<Group>>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut groups: BTreeMap<String, Vec<(char, f64)>> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let record = record?;
        let accession = match record.accession {
            Some(acc) if acc.is_empty() => {
                skipped += 1;
                continue;
            }
            Some(acc) => acc,
            None => UNKNOWN_ACCESSION.to_string(),
        };
        groups
            .entry(accession)
            .or_default()
            .push((record.residue, record.score));
    }

    if skipped > 0 {
        warn!("skipped {} rows with an empty accession", skipped);
    }

    let mut groups: Vec<Group> = groups
        .into_iter()
        .map(|(accession, residues)| Group {
            accession,
            residues,
        })
        .collect();

    // purely numeric accessions sort as numbers, so "2" comes before "10"
    let numeric: Option<Vec<i64>> = groups.iter().map(|g| g.accession.parse().ok()).collect();
    if let Some(keys) = numeric {
        let mut keyed: Vec<(i64, Group)> = keys.into_iter().zip(groups).collect();
        keyed.sort_by_key(|(k, _)| *k);
        groups = keyed.into_iter().map(|(_, g)| g).collect();
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residues(seq: &str, scores: &[f64]) -> Vec<(char, f64)> {
        seq.chars().zip(scores.iter().copied()).collect()
    }

    #[test]
    fn two_runs() {
        let epitopes = Extractor::default().extract(
            "P1",
            residues("ACDEF", &[0.05, 0.20, 0.30, 0.05, 0.90]),
        );
        assert_eq!(
            epitopes,
            vec![
                Epitope {
                    accession: "P1".into(),
                    sequence: "CD".into(),
                    start: 2,
                    end: 3,
                    mean_score: 0.25,
                },
                Epitope {
                    accession: "P1".into(),
                    sequence: "F".into(),
                    start: 5,
                    end: 5,
                    mean_score: 0.9,
                },
            ]
        );
    }

    #[test]
    fn empty_group_has_no_epitopes() {
        assert!(Extractor::default().extract("P1", Vec::new()).is_empty());
    }

    #[test]
    fn all_below_threshold() {
        let e = Extractor::new(0.5).extract("P1", residues("MKV", &[0.1, 0.49, 0.2]));
        assert!(e.is_empty());
    }

    #[test]
    fn all_above_threshold_spans_group() {
        let e = Extractor::new(0.5).extract("P1", residues("MKVL", &[0.6, 0.7, 0.8, 0.9]));
        assert_eq!(e.len(), 1);
        assert_eq!((e[0].start, e[0].end), (1, 4));
        assert_eq!(e[0].sequence, "MKVL");
        assert_eq!(e[0].mean_score, 0.75);
    }

    #[test]
    fn threshold_is_inclusive() {
        let e = Extractor::new(0.5).extract("P1", residues("AB", &[0.5, 0.4]));
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].sequence, "A");
    }

    #[test]
    fn nan_breaks_a_run() {
        let e = Extractor::new(0.5).extract("P1", residues("ABC", &[0.9, f64::NAN, 0.9]));
        assert_eq!(e.len(), 2);
        assert_eq!((e[1].start, e[1].end), (3, 3));
    }

    #[test]
    fn runs_are_maximal_and_ordered() {
        let scores = [0.9, 0.1, 0.2, 0.3, 0.0, 0.16, 0.15, 0.9, 0.9];
        let seq = "ABCDEFGHI";
        let extractor = Extractor::default();
        let epitopes = extractor.extract("P1", residues(seq, &scores));
        let chars: Vec<char> = seq.chars().collect();

        for pair in epitopes.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
        for e in &epitopes {
            assert_eq!(e.len(), e.end - e.start + 1);
            let expected: String = chars[e.start - 1..e.end].iter().collect();
            assert_eq!(e.sequence, expected);
            assert!(scores[e.start - 1..e.end].iter().all(|&s| s >= extractor.threshold()));
            if e.start > 1 {
                assert!(scores[e.start - 2] < extractor.threshold());
            }
            if e.end < scores.len() {
                assert!(scores[e.end] < extractor.threshold());
            }
        }
        assert_eq!(epitopes.len(), 4);
    }

    #[test]
    fn mean_is_rounded() {
        let e = Extractor::new(0.0).extract("P1", residues("ABC", &[0.1, 0.2, 0.2]));
        assert_eq!(e[0].mean_score, 0.166667);
        assert_eq!(round_score(0.1234564), 0.123456);
    }

    #[test]
    fn groups_sorted_by_accession() {
        let rec = |acc: &str, residue: char, score: f64| -> Result<Record> {
            Ok(Record {
                accession: Some(acc.to_string()),
                residue,
                score,
            })
        };
        let groups = group_records(vec![
            rec("P2", 'M', 0.9),
            rec("P1", 'A', 0.1),
            rec("", 'X', 0.9),
            rec("P2", 'K', 0.8),
        ])
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].accession, "P1");
        assert_eq!(groups[1].residues, vec![('M', 0.9), ('K', 0.8)]);

        let epitopes = Extractor::default().extract_groups(&groups);
        assert_eq!(epitopes.len(), 1);
        assert_eq!(epitopes[0].accession, "P2");
        assert_eq!(epitopes[0].sequence, "MK");
    }

    #[test]
    fn integer_accessions_sort_numerically() {
        let rec = |acc: &str| -> Result<Record> {
            Ok(Record {
                accession: Some(acc.to_string()),
                residue: 'A',
                score: 0.9,
            })
        };
        let order = |accs: &[&str]| -> Vec<String> {
            group_records(accs.iter().map(|a| rec(*a)))
                .unwrap()
                .into_iter()
                .map(|g| g.accession)
                .collect()
        };
        assert_eq!(order(&["10", "2", "1", "2"]), vec!["1", "2", "10"]);
        // one non-numeric accession keeps text order
        assert_eq!(order(&["10", "2", "P1"]), vec!["10", "2", "P1"]);
    }

    #[test]
    fn records_without_accession_share_one_group() {
        let groups = group_records((0..3).map(|i| -> Result<Record> {
            Ok(Record {
                accession: None,
                residue: 'A',
                score: i as f64,
            })
        }))
        .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].accession, UNKNOWN_ACCESSION);
        assert_eq!(groups[0].residues.len(), 3);
    }
}
