// Gene-level parsimony over peptide evidence.
//
// Genes are connected to the observed peptides their proteins digest into. Genes
// explaining exactly the same peptides are indistinguishable and reported as one
// shared group; genes whose peptides are a proper subset of another gene's are
// subsumed and only kept for accounting. Spectral counts of peptides matching more
// than one gene are split in proportion to the spectral counts of each gene's
// unique peptides, those matching no other gene.

use crate::peptide::Peptides;
use crate::{Error, Node};
use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Gene ID to the unmodified peptides its proteins could produce
pub type GenePeptides = BTreeMap<String, BTreeSet<String>>;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Gene {
    /// Allotted spectral count
    pub count: f64,
    pub is_subsumed: bool,
    /// Allotted spectral count per modified peptide form
    pub peptide_count: BTreeMap<String, f64>,
    /// Modified peptide forms explained by this gene, the keys of `peptide_count`
    pub peptides: Vec<String>,
    /// Genes explaining exactly the same peptides
    pub shared: Vec<String>,
    /// Genes whose peptides are a proper subset of this gene's
    pub subsumed: Vec<String>,
    /// Peptides explained by this gene, each counted by the fraction of its
    /// spectral count allotted here: 1 for a unique peptide, less for a shared
    /// one. Meaningful when `shared` is empty
    pub unique: f64,
    /// Number of peptides matching exactly this gene's shared group; meaningful
    /// when `shared` is not empty
    pub unique_shared: usize,
}

pub type Genes = BTreeMap<String, Gene>;

#[derive(Default)]
struct Groups {
    index: BTreeMap<String, usize>,
    members: Vec<BTreeSet<String>>,
}

impl Groups {
    /// Partition genes by identical matched peptide sets
    fn new(matched: &GenePeptides) -> Self {
        let mut classes: BTreeMap<&BTreeSet<String>, BTreeSet<String>> = BTreeMap::new();
        for (gene, peptides) in matched {
            classes.entry(peptides).or_default().insert(gene.clone());
        }

        let mut groups = Groups::default();
        for (ix, members) in classes.into_values().enumerate() {
            for gene in &members {
                groups.index.insert(gene.clone(), ix);
            }
            groups.members.push(members);
        }
        groups
    }

    /// The group `gene` belongs to, including `gene` itself
    fn of(&self, gene: &str) -> &BTreeSet<String> {
        &self.members[self.index[gene]]
    }
}

/// The resolved gene/peptide evidence graph for one input file
#[derive(Clone, Debug, Default)]
pub struct Inference {
    /// Every gene with evidence, subsumed genes included
    pub genes: Genes,
    pub peptides: Peptides,
    /// Modified peptide form to its unmodified sequence
    pub forms: BTreeMap<String, String>,
}

impl Inference {
    /// Resolve sharing, subsumption and spectral count allocation.
    ///
    /// `digested` holds the peptides each gene could produce; only those present
    /// in `peptides` count as matches. Candidate genes already present on a
    /// [`PeptideStat`](crate::peptide::PeptideStat) seed are kept, but must exist
    /// in `digested`. A seed without modified forms counts as its own form.
    pub fn build(digested: &GenePeptides, peptides: Peptides) -> Result<Self, Error> {
        let time = Instant::now();
        let (matched, peptides) = candidacy(digested, peptides)?;
        let groups = Groups::new(&matched);

        // Superset gene -> the genes it subsumes
        let mut subsumes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (gene, set) in &matched {
            let mut iter = set.iter();
            let mut supersets = match iter.next() {
                Some(first) => peptides[first].genes.iter().collect::<BTreeSet<_>>(),
                None => continue,
            };
            for peptide in iter {
                let genes = &peptides[peptide].genes;
                supersets.retain(|candidate| genes.contains(*candidate));
            }
            let group = groups.of(gene);
            for superset in supersets.into_iter().filter(|g| !group.contains(*g)) {
                subsumes
                    .entry(superset.clone())
                    .or_default()
                    .insert(gene.clone());
            }
        }
        let subsumed = subsumes.values().flatten().collect::<BTreeSet<_>>();

        // Spectral counts of the peptides only this gene explains
        let weights = matched
            .iter()
            .map(|(gene, set)| {
                let weight = set
                    .iter()
                    .map(|peptide| &peptides[peptide])
                    .filter(|stat| stat.unique)
                    .map(|stat| stat.count)
                    .sum::<f64>();
                (gene.as_str(), weight)
            })
            .collect::<BTreeMap<_, _>>();

        let mut allotted: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
        // Fraction of each peptide a gene was allotted, summed over its peptides
        let mut fractions: BTreeMap<&str, f64> = BTreeMap::new();
        let mut degenerate = 0;
        for (peptide, stat) in &peptides {
            let total = stat.genes.iter().map(|g| weights[g.as_str()]).sum::<f64>();
            // Members of one shared group have no evidence to tell them apart
            let within_group = stat
                .genes
                .iter()
                .next()
                .map_or(true, |first| stat.genes.is_subset(groups.of(first)));
            if total <= 0.0 && !within_group {
                log::debug!(
                    "no unique evidence for genes of `{}`, splitting its spectral count equally",
                    peptide
                );
                degenerate += 1;
            }
            for gene in &stat.genes {
                let share = match total > 0.0 {
                    true => weights[gene.as_str()] / total,
                    false => 1.0 / stat.genes.len() as f64,
                };
                *fractions.entry(gene.as_str()).or_default() += share;
                let counts = allotted.entry(gene.as_str()).or_default();
                for (form, count) in &stat.modified {
                    counts.insert(form.clone(), share * count);
                }
            }
        }

        let mut genes = Genes::new();
        for (gene, set) in &matched {
            let group = groups.of(gene);
            let peptide_count = allotted.remove(gene.as_str()).unwrap_or_default();
            let unique_shared = match group.len() > 1 {
                true => set.iter().filter(|p| peptides[*p].genes == *group).count(),
                false => 0,
            };
            genes.insert(
                gene.clone(),
                Gene {
                    count: peptide_count.values().sum(),
                    is_subsumed: subsumed.contains(gene),
                    peptides: peptide_count.keys().cloned().collect(),
                    peptide_count,
                    shared: group.iter().filter(|g| *g != gene).cloned().collect(),
                    subsumed: subsumes
                        .get(gene)
                        .map(|s| s.iter().cloned().collect())
                        .unwrap_or_default(),
                    unique: fractions.get(gene.as_str()).copied().unwrap_or_default(),
                    unique_shared,
                },
            );
        }

        let forms = peptides
            .iter()
            .flat_map(|(peptide, stat)| {
                stat.modified
                    .keys()
                    .map(move |form| (form.clone(), peptide.clone()))
            })
            .collect();

        info!(
            "- inferred {} genes ({} subsumed, {} shared groups) from {} peptides in {}ms",
            genes.len(),
            subsumed.len(),
            groups.members.iter().filter(|m| m.len() > 1).count(),
            peptides.len(),
            time.elapsed().as_millis()
        );
        if degenerate > 0 {
            info!(
                "- {} peptides were split equally between genes without unique evidence",
                degenerate
            );
        }

        Ok(Inference {
            genes,
            peptides,
            forms,
        })
    }

    /// Genes that are reported: everything that is not subsumed
    pub fn reported(&self) -> impl Iterator<Item = (&String, &Gene)> {
        self.genes.iter().filter(|(_, gene)| !gene.is_subsumed)
    }
}

/// Match genes to observed peptides and fill in candidate genes for every peptide
fn candidacy(
    digested: &GenePeptides,
    mut peptides: Peptides,
) -> Result<(GenePeptides, Peptides), Error> {
    let mut matched: GenePeptides = digested
        .iter()
        .map(|(gene, digest)| {
            let set = digest
                .iter()
                .filter(|peptide| peptides.contains_key(*peptide))
                .cloned()
                .collect();
            (gene.clone(), set)
        })
        .collect();

    for (peptide, stat) in &peptides {
        for gene in &stat.genes {
            match matched.get_mut(gene) {
                Some(set) => {
                    set.insert(peptide.clone());
                }
                None => {
                    return Err(Error::DanglingReference {
                        peptide: peptide.clone(),
                        gene: gene.clone(),
                    })
                }
            }
        }
    }

    if let Some((gene, _)) = matched.iter().find(|(_, set)| set.is_empty()) {
        return Err(Error::NoEvidence(Node::Gene(gene.clone())));
    }

    for (gene, set) in &matched {
        for peptide in set {
            if let Some(stat) = peptides.get_mut(peptide) {
                stat.genes.insert(gene.clone());
            }
        }
    }

    for (peptide, stat) in peptides.iter_mut() {
        if stat.genes.is_empty() {
            return Err(Error::NoEvidence(Node::Peptide(peptide.clone())));
        }
        if stat.modified.is_empty() {
            stat.modified.insert(peptide.clone(), stat.count);
        }
        stat.count = stat.modified.values().sum();
        stat.unique = stat.genes.len() == 1;
    }

    Ok((matched, peptides))
}
