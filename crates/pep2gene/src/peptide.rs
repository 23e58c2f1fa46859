use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A single peptide identification from a search pipeline
#[derive(Clone, Debug, PartialEq)]
pub struct Identification {
    /// Peptide sequence as reported, including modification annotations
    pub modified: String,
    /// Unmodified amino acid sequence
    pub sequence: String,
    /// Spectral count contributed by this identification (or intensity, for
    /// intensity-based pipelines)
    pub weight: f64,
}

impl Identification {
    pub fn new<S: Into<String>>(modified: S, weight: f64) -> Self {
        let modified = modified.into();
        Identification {
            sequence: strip_modifications(&modified),
            modified,
            weight,
        }
    }
}

/// Remove modification annotations from a peptide: anything enclosed in
/// brackets, parentheses or braces, and every character that is not an
/// uppercase letter (terminal markers such as `n`, `c`, `-` or `.`).
pub fn strip_modifications(modified: &str) -> String {
    let mut depth = 0usize;
    let mut sequence = String::with_capacity(modified.len());
    for c in modified.chars() {
        match c {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && c.is_ascii_uppercase() => sequence.push(c),
            _ => {}
        }
    }
    sequence
}

/// Aggregate evidence for one unmodified peptide
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PeptideStat {
    /// Total spectral count over all modified forms
    pub count: f64,
    /// Candidate genes
    pub genes: BTreeSet<String>,
    /// Spectral count per modified form
    pub modified: BTreeMap<String, f64>,
    /// Exactly one candidate gene
    pub unique: bool,
}

impl PeptideStat {
    /// A fresh stat with the totals of `modified`
    pub fn from_modified(modified: BTreeMap<String, f64>) -> Self {
        PeptideStat {
            count: modified.values().sum(),
            modified,
            ..Default::default()
        }
    }
}

/// Unmodified peptide sequence to its evidence
pub type Peptides = BTreeMap<String, PeptideStat>;

/// Roll identifications up into per-peptide spectral counts
pub fn accumulate<I>(identifications: I) -> Peptides
where
    I: IntoIterator<Item = Identification>,
{
    let mut peptides = Peptides::new();
    for id in identifications {
        if id.sequence.is_empty() {
            log::warn!("ignoring identification `{}` without residues", id.modified);
            continue;
        }
        let stat = peptides.entry(id.sequence).or_default();
        stat.count += id.weight;
        *stat.modified.entry(id.modified).or_default() += id.weight;
    }
    peptides
}
