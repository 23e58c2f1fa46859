//! Display-ready view of an [`Inference`]

use crate::inference::{Gene, Inference};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeptideSummary {
    pub allotted_spectral_count: f64,
    pub total_spectral_count: f64,
    pub unique: bool,
    pub unique_shared: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneSummary {
    pub name: String,
    pub peptides: BTreeMap<String, PeptideSummary>,
    #[serde(rename = "sharedIDs")]
    pub shared_ids: Vec<String>,
    pub shared_names: Vec<String>,
    pub spectral_count: f64,
    pub subsumed: Vec<String>,
    pub unique: i64,
    pub unique_shared: usize,
}

/// Summarize every reported (non-subsumed) gene, keyed by gene ID. Gene names
/// missing from `names` fall back to the gene ID.
pub fn summarize(
    inference: &Inference,
    names: &BTreeMap<String, String>,
) -> BTreeMap<String, GeneSummary> {
    let name_of = |id: &String| names.get(id).cloned().unwrap_or_else(|| id.clone());

    inference
        .reported()
        .map(|(id, gene)| {
            // Sort by name, keeping IDs aligned; ties are broken by ID
            let (shared_names, shared_ids): (Vec<_>, Vec<_>) = gene
                .shared
                .iter()
                .map(|shared| (name_of(shared), shared.clone()))
                .sorted()
                .unzip();

            let (unique, unique_shared) = match gene.shared.is_empty() {
                true => (gene.unique.round() as i64, 0),
                false => (0, gene.unique_shared),
            };

            let summary = GeneSummary {
                name: name_of(id),
                peptides: summarize_peptides(id, gene, inference),
                shared_ids,
                shared_names,
                spectral_count: gene.count,
                subsumed: gene.subsumed.iter().cloned().sorted().collect(),
                unique,
                unique_shared,
            };
            (id.clone(), summary)
        })
        .collect()
}

fn summarize_peptides(
    id: &String,
    gene: &Gene,
    inference: &Inference,
) -> BTreeMap<String, PeptideSummary> {
    let group = gene
        .shared
        .iter()
        .chain(std::iter::once(id))
        .collect::<BTreeSet<_>>();

    gene.peptide_count
        .iter()
        .filter_map(|(form, &allotted)| {
            let stat = inference
                .forms
                .get(form)
                .and_then(|peptide| inference.peptides.get(peptide))?;
            let (unique, unique_shared) = match group.len() {
                1 => (stat.unique, false),
                _ => (false, stat.genes.iter().eq(group.iter().copied())),
            };
            let summary = PeptideSummary {
                allotted_spectral_count: allotted,
                total_spectral_count: stat.modified.get(form).copied().unwrap_or_default(),
                unique,
                unique_shared,
            };
            Some((form.clone(), summary))
        })
        .collect()
}
