//! OpenSWATH / pyprophet tab-separated exports

use super::{column, required_column, tsv_reader, Filter};
use crate::peptide::{strip_modifications, Identification};
use crate::Error;
use std::io::BufRead;

/// Read peak groups passing the m_score, experiment-wide peptide m_score and
/// rank thresholds. Each peak group
/// contributes its intensity instead of a spectral count.
pub fn read<R: BufRead>(reader: R, filter: &Filter) -> Result<Vec<Identification>, Error> {
    let mut rdr = tsv_reader(reader);
    let headers = rdr.headers()?.clone();
    let modified = required_column(&headers, &["FullPeptideName"])?;
    let intensity = required_column(&headers, &["Intensity"])?;
    let sequence = column(&headers, &["Sequence"]);
    let mscore = column(&headers, &["m_score"]);
    let experiment_wide = column(&headers, &["m_score_peptide_experiment_wide"]);
    let rank = column(&headers, &["peak_group_rank"]);
    let decoy = column(&headers, &["decoy"]);

    let mut identifications = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let field = |ix: Option<usize>| ix.and_then(|ix| record.get(ix)).map(str::trim);

        if field(decoy) == Some("1") {
            continue;
        }
        if let Some(value) = field(mscore) {
            if value.parse::<f64>()? > filter.mscore {
                continue;
            }
        }
        if let Some(value) = field(experiment_wide) {
            if value.parse::<f64>()? > filter.mscore_peptide_experiment_wide {
                continue;
            }
        }
        if let Some(value) = field(rank) {
            // Ranks are written as floats by some versions of pyprophet
            if value.parse::<f64>()? > filter.peak_group_rank as f64 {
                continue;
            }
        }

        let full = match field(Some(modified)) {
            Some(full) if !full.is_empty() => full,
            _ => continue,
        };
        let weight = field(Some(intensity)).unwrap_or_default().parse::<f64>()?;
        identifications.push(Identification {
            modified: full.into(),
            sequence: field(sequence)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .unwrap_or_else(|| strip_modifications(full)),
            weight,
        });
    }
    Ok(identifications)
}
