//! Readers for the peptide identifications of supported search pipelines

use crate::peptide::Identification;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

pub mod msplit;
pub mod openswath;
pub mod pepxml;
pub mod sage;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pipeline {
    /// Trans-Proteomic Pipeline pepXML with PeptideProphet probabilities
    Tpp,
    MsplitDda,
    MsplitDia,
    #[serde(rename = "OPENSWATH")]
    OpenSwath,
    Sage,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::Tpp
    }
}

impl std::str::FromStr for Pipeline {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "TPP" => Ok(Self::Tpp),
            "MSPLIT_DDA" => Ok(Self::MsplitDda),
            "MSPLIT_DIA" => Ok(Self::MsplitDia),
            "OPENSWATH" => Ok(Self::OpenSwath),
            "SAGE" => Ok(Self::Sage),
            _ => Err(Error::InvalidInput(format!("unknown pipeline `{}`", s))),
        }
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Tpp => "TPP",
            Self::MsplitDda => "MSPLIT_DDA",
            Self::MsplitDia => "MSPLIT_DIA",
            Self::OpenSwath => "OPENSWATH",
            Self::Sage => "SAGE",
        })
    }
}

/// Thresholds applied while reading, before any evidence reaches inference
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Filter {
    /// Maximum FDR / q-value (MSPLIT-DDA, Sage)
    pub fdr: f64,
    /// Minimum PeptideProphet probability (TPP)
    pub peptide_probability: f64,
    /// Maximum m_score (OpenSWATH)
    pub mscore: f64,
    /// Maximum experiment-wide peptide m_score (OpenSWATH)
    pub mscore_peptide_experiment_wide: f64,
    /// Maximum peak group rank (OpenSWATH)
    pub peak_group_rank: u32,
    pub ignore_decoys: bool,
    /// Protein prefix marking decoy hits (TPP)
    pub decoy_tag: String,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            fdr: 0.01,
            peptide_probability: 0.85,
            mscore: 0.01,
            mscore_peptide_experiment_wide: 0.01,
            peak_group_rank: 1,
            ignore_decoys: false,
            decoy_tag: "DECOY_".into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchResults {
    pub identifications: Vec<Identification>,
    /// Digestion enzyme declared by the result file, if any
    pub enzyme: Option<String>,
}

/// Read the identifications of `pipeline` that pass `filter`
pub fn read<R: BufRead>(
    pipeline: Pipeline,
    reader: R,
    filter: &Filter,
) -> Result<SearchResults, Error> {
    let results = match pipeline {
        Pipeline::Tpp => pepxml::read(reader, filter)?,
        Pipeline::MsplitDda => SearchResults {
            identifications: msplit::read(reader, Some(filter.fdr))?,
            enzyme: None,
        },
        Pipeline::MsplitDia => SearchResults {
            identifications: msplit::read(reader, None)?,
            enzyme: None,
        },
        Pipeline::OpenSwath => SearchResults {
            identifications: openswath::read(reader, filter)?,
            enzyme: None,
        },
        Pipeline::Sage => SearchResults {
            identifications: sage::read(reader, filter)?,
            enzyme: None,
        },
    };
    log::info!(
        "- read {} {} identifications",
        results.identifications.len(),
        pipeline
    );
    Ok(results)
}

/// Index of the first header matching any of `names`, ignoring case
pub(crate) fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|name| h.trim().eq_ignore_ascii_case(name)))
}

pub(crate) fn required_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize, Error> {
    column(headers, names)
        .ok_or_else(|| Error::Malformed(format!("missing `{}` column", names[0])))
}

pub(crate) fn tsv_reader<R: BufRead>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader)
}
