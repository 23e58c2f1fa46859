//! Sage `results.sage.tsv` reports

use super::{column, required_column, tsv_reader, Filter};
use crate::peptide::Identification;
use crate::Error;
use std::io::BufRead;

/// Keep PSMs with `peptide_q` at or below the FDR threshold; decoy PSMs
/// (`label` of -1) are dropped when decoys are ignored.
pub fn read<R: BufRead>(reader: R, filter: &Filter) -> Result<Vec<Identification>, Error> {
    let mut rdr = tsv_reader(reader);
    let headers = rdr.headers()?.clone();
    let peptide = required_column(&headers, &["peptide"])?;
    let q = required_column(&headers, &["peptide_q"])?;
    let label = column(&headers, &["label"]);

    let mut identifications = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let sequence = match record.get(peptide).map(str::trim) {
            Some(sequence) if !sequence.is_empty() => sequence,
            _ => continue,
        };
        let peptide_q = record.get(q).unwrap_or_default().trim().parse::<f64>()?;
        if peptide_q > filter.fdr {
            continue;
        }
        if filter.ignore_decoys {
            if let Some(ix) = label {
                if record.get(ix).map(str::trim) == Some("-1") {
                    continue;
                }
            }
        }
        identifications.push(Identification::new(sequence, 1.0));
    }
    Ok(identifications)
}
