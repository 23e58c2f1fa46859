use crate::input::Settings;
use crate::output::Report;
use crate::storage::Storage;
use anyhow::Context;
use log::info;
use pep2gene_core::enzyme::EnzymeParameters;
use pep2gene_core::fasta::{Fasta, GeneMap};
use pep2gene_core::inference::Inference;
use pep2gene_core::mapping::match_peptides;
use pep2gene_core::peptide::accumulate;
use pep2gene_core::report::summarize;
use pep2gene_core::search;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct Runner<'s, S: Storage> {
    pub parameters: Settings,
    storage: &'s S,
    start: Instant,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl<'s, S: Storage> Runner<'s, S> {
    pub fn new(parameters: Settings, storage: &'s S) -> Self {
        Self {
            parameters,
            storage,
            start: Instant::now(),
        }
    }

    fn load_database(&self) -> anyhow::Result<Fasta> {
        let start = Instant::now();
        let gene_map = match &self.parameters.map {
            Some(path) => {
                let map = GeneMap::parse(self.storage.reader(path)?)
                    .with_context(|| format!("Failed to read gene map `{}`", path.display()))?;
                info!("- loaded {} gene map entries", map.len());
                Some(map)
            }
            None => None,
        };

        let path = &self.parameters.database;
        let contents = self
            .storage
            .read_to_string(path)
            .with_context(|| format!("Failed to read FASTA database `{}`", path.display()))?;
        let fasta = Fasta::parse(
            &contents,
            &self.parameters.filter.decoy_tag,
            gene_map.as_ref(),
            self.parameters.ignore_invalid,
        )
        .with_context(|| format!("Failed to parse FASTA database `{}`", path.display()))?;

        info!(
            "- loaded {} proteins in {}ms",
            fasta.proteins.len(),
            start.elapsed().as_millis()
        );
        Ok(fasta)
    }

    // Output file for `input` in the output directory: `<stem>.pep2gene.<ext>`
    fn make_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results".into());
        self.parameters.output_directory.join(format!(
            "{}.pep2gene.{}",
            stem,
            self.parameters.output_format.extension()
        ))
    }

    /// Run the whole pipeline and return the path of the written report
    pub fn run(&self) -> anyhow::Result<PathBuf> {
        let fasta = self.load_database()?;

        let path = &self.parameters.file;
        let reader = self.storage.reader(path)?;
        let results = search::read(self.parameters.pipeline, reader, &self.parameters.filter)
            .with_context(|| format!("Failed to read search results `{}`", path.display()))?;

        let mut enzyme = self.parameters.enzyme.clone();
        if self.parameters.infer_enzyme && enzyme.name.is_none() && enzyme.cleave_at.is_none() {
            match results.enzyme {
                Some(ref name) => {
                    info!("- using enzyme `{}` declared by search results", name);
                    enzyme.name = Some(name.clone());
                }
                None => log::warn!("search results do not declare an enzyme to infer"),
            }
        }
        let parameters = EnzymeParameters::try_from(enzyme)?;
        let enzyme_name = parameters.enzyme.as_ref().map(|e| e.name.clone());

        let mut peptides = accumulate(results.identifications);
        let matches = match_peptides(&fasta, &parameters, &peptides)?;
        for peptide in &matches.unmatched {
            peptides.remove(peptide);
        }

        let inference = Inference::build(&matches.genes, peptides)?;
        let genes = summarize(&inference, &fasta.gene_names());

        let report = Report {
            database: file_name(&self.parameters.database),
            enzyme: enzyme_name,
            fdr: self.parameters.filter.fdr,
            file: file_name(&self.parameters.file),
            genes: &genes,
            missed_cleavages: parameters.missed_cleavages,
            peptide_probability: self.parameters.filter.peptide_probability,
            pipeline: self.parameters.pipeline.to_string(),
            unmatched: &matches.unmatched,
        };
        let bytes = report.serialize(self.parameters.output_format)?;

        let output = self.make_path(&self.parameters.file);
        self.storage
            .write_bytes(&output, bytes)
            .with_context(|| format!("Failed to write `{}`", output.display()))?;

        info!(
            "- reported {} genes to {}",
            genes.len(),
            output.display()
        );
        info!("finished in {}ms", self.start.elapsed().as_millis());
        Ok(output)
    }
}
