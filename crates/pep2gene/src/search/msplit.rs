//! MSPLIT-DDA and MSPLIT-DIA tab-separated reports

use super::{column, required_column, tsv_reader};
use crate::peptide::Identification;
use crate::Error;
use std::io::BufRead;

/// Read one identification per row. When `fdr` is given and the report has an
/// FDR column, rows above the threshold are dropped.
pub fn read<R: BufRead>(reader: R, fdr: Option<f64>) -> Result<Vec<Identification>, Error> {
    let mut rdr = tsv_reader(reader);
    let headers = rdr.headers()?.clone();
    let peptide = required_column(&headers, &["Peptide", "Annotation"])?;
    let fdr_column = fdr.and_then(|threshold| {
        column(&headers, &["FDR", "q-value", "qvalue"]).map(|ix| (ix, threshold))
    });

    let mut identifications = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let sequence = match record.get(peptide).map(str::trim) {
            Some(sequence) if !sequence.is_empty() => sequence,
            _ => continue,
        };
        if let Some((ix, threshold)) = fdr_column {
            let value = record
                .get(ix)
                .ok_or_else(|| Error::Malformed(format!("row without FDR for `{}`", sequence)))?
                .trim()
                .parse::<f64>()?;
            if value > threshold {
                continue;
            }
        }
        identifications.push(Identification::new(sequence, 1.0));
    }
    Ok(identifications)
}

#[cfg(test)]
mod test {
    use super::*;

    const DIA: &str = "#File\tScan#\tMz\tz\tPeptide\tMz\tz\tcosine\tName\n\
file.mzXML\t6621\t504.17\t-1\tABC\t500.25\t2\t0.95\t1/P23588\n\
file.mzXML\t6691\t504.17\t-1\tDEF\t500.25\t2\t0.94\t1/P23588\n\
file.mzXML\t6792\t404.93\t-1\tGHI\t414.71\t2\t0.89\t1/P61978\n\
file.mzXML\t6838\t679.22\t-1\tJK[147]L\t685.78\t2\t0.90\t1/P23588\n";

    const DDA: &str = "#SpectrumFile\tScan#\tPeptide\tcosine\tFDR\n\
a.mzXML\t1\tPEPTIDEK\t0.9\t0.001\n\
a.mzXML\t2\tPEPTM[147]IDEK\t0.8\t0.009\n\
a.mzXML\t3\tDECOYK\t0.4\t0.2\n";

    #[test]
    fn msplit_dia() {
        let ids = read(DIA.as_bytes(), None).unwrap();
        let peptides = ids
            .iter()
            .map(|id| (id.modified.as_str(), id.sequence.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            peptides,
            vec![("ABC", "ABC"), ("DEF", "DEF"), ("GHI", "GHI"), ("JK[147]L", "JKL")]
        );
    }

    #[test]
    fn msplit_dda_fdr() {
        let ids = read(DDA.as_bytes(), Some(0.01)).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1].sequence, "PEPTMIDEK");

        let ids = read(DDA.as_bytes(), None).unwrap();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn missing_peptide_column() {
        assert!(matches!(
            read("a\tb\n1\t2\n".as_bytes(), None),
            Err(Error::Malformed(_))
        ));
    }
}
