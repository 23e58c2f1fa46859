use crate::enzyme::EnzymeParameters;
use crate::fasta::Fasta;
use crate::inference::GenePeptides;
use crate::peptide::Peptides;
use crate::Error;
use log::info;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::time::Instant;

/// Observed peptides matched against a protein database
#[derive(Debug, Default)]
pub struct Matches {
    /// Genes with at least one observed peptide, and those peptides
    pub genes: GenePeptides,
    /// Observed peptides no protein could produce
    pub unmatched: Vec<String>,
}

/// Digest every protein in `fasta` and keep the observed peptides each gene can
/// produce. Without an enzyme, a peptide matches any protein containing it.
pub fn match_peptides(
    fasta: &Fasta,
    enzyme: &EnzymeParameters,
    peptides: &Peptides,
) -> Result<Matches, Error> {
    let time = Instant::now();

    // Results come back in database order, regardless of scheduling
    let per_protein = fasta
        .proteins
        .par_iter()
        .map(|protein| -> Result<Vec<String>, Error> {
            let found = match enzyme.enzyme {
                Some(_) => enzyme
                    .digest(&protein.sequence)?
                    .into_iter()
                    .map(|digest| digest.sequence)
                    .filter(|sequence| peptides.contains_key(sequence))
                    .collect(),
                None => peptides
                    .keys()
                    .filter(|peptide| protein.sequence.contains(peptide.as_str()))
                    .cloned()
                    .collect(),
            };
            Ok(found)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut genes = GenePeptides::new();
    for (protein, found) in fasta.proteins.iter().zip(per_protein) {
        if found.is_empty() {
            continue;
        }
        genes
            .entry(protein.gene_id.clone())
            .or_default()
            .extend(found);
    }

    let seen = genes.values().flatten().collect::<BTreeSet<_>>();
    let unmatched = peptides
        .keys()
        .filter(|peptide| !seen.contains(peptide))
        .cloned()
        .collect::<Vec<_>>();

    info!(
        "- matched {} of {} peptides to {} genes in {}ms",
        peptides.len() - unmatched.len(),
        peptides.len(),
        genes.len(),
        time.elapsed().as_millis()
    );
    if !unmatched.is_empty() {
        log::warn!(
            "{} peptides do not match any gene in the database and will not be reported",
            unmatched.len()
        );
    }

    Ok(Matches { genes, unmatched })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::enzyme::Enzyme;
    use crate::peptide::{accumulate, Identification};

    fn fasta() -> Fasta {
        Fasta::parse(
            ">p1 gn|ONE:1|\nAAAKCCCKDDDR\n>p2 gn|TWO:2|\nBBBKCCCR\n>p3 gn|ONE:1|\nEEEKFFFR\n",
            "DECOY_",
            None,
            false,
        )
        .unwrap()
    }

    fn observed(peptides: &[&str]) -> Peptides {
        accumulate(peptides.iter().map(|p| Identification::new(*p, 1.0)))
    }

    #[test]
    fn tryptic_matches() {
        let enzyme = EnzymeParameters {
            missed_cleavages: 1,
            enzyme: Enzyme::from_name("trypsin"),
        };
        let matches = match_peptides(
            &fasta(),
            &enzyme,
            &observed(&["AAAK", "CCCK", "CCCKDDDR", "FFFR", "CCCR", "ZZZK"]),
        )
        .unwrap();

        let one = matches.genes["1"].iter().collect::<Vec<_>>();
        assert_eq!(one, vec!["AAAK", "CCCK", "CCCKDDDR", "FFFR"]);
        let two = matches.genes["2"].iter().collect::<Vec<_>>();
        assert_eq!(two, vec!["CCCR"]);
        assert_eq!(matches.unmatched, vec!["ZZZK"]);
    }

    #[test]
    fn substring_matches_without_enzyme() {
        let enzyme = EnzymeParameters {
            missed_cleavages: 0,
            enzyme: None,
        };
        let matches =
            match_peptides(&fasta(), &enzyme, &observed(&["KCCC", "AKC", "QQQ"])).unwrap();
        assert_eq!(matches.genes["1"].len(), 2);
        assert_eq!(matches.genes["2"].iter().collect::<Vec<_>>(), vec!["KCCC"]);
        assert_eq!(matches.unmatched, vec!["QQQ"]);
    }
}
