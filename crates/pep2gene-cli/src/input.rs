use crate::output::OutputFormat;
use crate::storage::Storage;
use anyhow::{bail, Context};
use clap::ArgMatches;
use pep2gene_core::enzyme::{Enzyme, EnzymeBuilder, EnzymeParameters};
use pep2gene_core::search::{Filter, Pipeline};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize, Clone, Debug)]
/// Actual run parameters - may include overrides or default values not set by user
pub struct Settings {
    pub version: String,
    pub database: PathBuf,
    pub file: PathBuf,
    pub map: Option<PathBuf>,
    pub enzyme: EnzymeBuilder,
    pub pipeline: Pipeline,
    pub filter: Filter,
    pub output_format: OutputFormat,
    pub ignore_invalid: bool,
    pub infer_enzyme: bool,

    #[serde(skip_serializing)]
    pub output_directory: PathBuf,
}

#[derive(Deserialize, Default, Debug)]
/// Input parameters deserialized from a JSON file
pub struct Input {
    database: Option<String>,
    file: Option<String>,
    map: Option<String>,
    enzyme: Option<EnzymeBuilder>,
    pipeline: Option<String>,
    fdr: Option<f64>,
    peptide_probability: Option<f64>,
    mscore: Option<f64>,
    mscore_peptide_experiment_wide: Option<f64>,
    peak_group_rank: Option<u32>,
    ignore_decoys: Option<bool>,
    decoy_tag: Option<String>,
    ignore_invalid: Option<bool>,
    infer_enzyme: Option<bool>,
    #[serde(alias = "output")]
    output_format: Option<String>,
    output_directory: Option<String>,
}

impl Input {
    pub fn from_arguments<S: Storage>(matches: ArgMatches, storage: &S) -> anyhow::Result<Self> {
        let mut input = match matches.get_one::<String>("parameters") {
            Some(path) => Input::load(storage, path)
                .with_context(|| format!("Failed to read parameters from `{path}`"))?,
            None => Input::default(),
        };

        // Handle JSON configuration overrides
        if let Some(database) = matches.get_one::<String>("db") {
            log::trace!("overriding `database` parameter.");
            input.database = Some(database.into());
        }
        if let Some(file) = matches.get_one::<String>("file") {
            log::trace!("overriding `file` parameter.");
            input.file = Some(file.into());
        }
        if let Some(map) = matches.get_one::<String>("map") {
            log::trace!("overriding `map` parameter.");
            input.map = Some(map.into());
        }
        if let Some(name) = matches.get_one::<String>("enzyme") {
            log::trace!("overriding `enzyme.name` parameter.");
            input.enzyme.get_or_insert_with(Default::default).name = Some(name.into());
        }
        if let Some(missed) = matches.get_one::<u8>("missed-cleavages").copied() {
            log::trace!("overriding `enzyme.missed_cleavages` parameter.");
            input
                .enzyme
                .get_or_insert_with(Default::default)
                .missed_cleavages = Some(missed);
        }
        if let Some(pipeline) = matches.get_one::<String>("pipeline") {
            input.pipeline = Some(pipeline.into());
        }
        if let Some(fdr) = matches.get_one::<f64>("fdr").copied() {
            input.fdr = Some(fdr);
        }
        if let Some(pepprob) = matches.get_one::<f64>("pepprob").copied() {
            input.peptide_probability = Some(pepprob);
        }
        if let Some(mscore) = matches.get_one::<f64>("mscore").copied() {
            input.mscore = Some(mscore);
        }
        if let Some(mscore) = matches
            .get_one::<f64>("mscore-peptide-experiment-wide")
            .copied()
        {
            input.mscore_peptide_experiment_wide = Some(mscore);
        }
        if let Some(rank) = matches.get_one::<u32>("peak-group-rank").copied() {
            input.peak_group_rank = Some(rank);
        }
        if let Some(output) = matches.get_one::<String>("output") {
            input.output_format = Some(output.into());
        }
        if let Some(output_directory) = matches.get_one::<String>("output-directory") {
            log::trace!("overriding `output_directory` parameter.");
            input.output_directory = Some(output_directory.into());
        }
        // Flags only ever switch behavior on
        for (flag, field) in [
            ("ignore-decoys", &mut input.ignore_decoys),
            ("ignore-invalid", &mut input.ignore_invalid),
            ("infer-enzyme", &mut input.infer_enzyme),
        ] {
            if matches.get_flag(flag) {
                *field = Some(true);
            }
        }

        Ok(input)
    }

    pub fn load<S: Storage, P: AsRef<Path>>(storage: &S, path: P) -> anyhow::Result<Self> {
        let reader = storage.reader(path.as_ref())?;
        Ok(serde_json::from_reader(reader)?)
    }

    /// Resolve defaults and fall back on unrecognized values. Fails when the
    /// database or search result file is unset or does not exist.
    pub fn build<S: Storage>(self, storage: &S) -> anyhow::Result<Settings> {
        let mut missing = Vec::new();
        match &self.database {
            None => missing.push("missing FASTA database".to_string()),
            Some(path) if !storage.exists(Path::new(path)) => {
                missing.push(format!("FASTA database `{}` does not exist", path))
            }
            _ => {}
        }
        match &self.file {
            None => missing.push("missing search result peptide file".to_string()),
            Some(path) if !storage.exists(Path::new(path)) => {
                missing.push(format!("search result file `{}` does not exist", path))
            }
            _ => {}
        }
        if let Some(path) = &self.map {
            if !storage.exists(Path::new(path)) {
                missing.push(format!("gene map `{}` does not exist", path));
            }
        }
        if !missing.is_empty() {
            bail!("{}", missing.join("; "));
        }

        let pipeline = match self.pipeline.as_deref().map(str::parse::<Pipeline>) {
            Some(Ok(pipeline)) => pipeline,
            Some(Err(e)) => {
                log::warn!("{}, using {}", e, Pipeline::default());
                Pipeline::default()
            }
            None => Pipeline::default(),
        };

        let output_format = match self.output_format.as_deref().map(str::parse::<OutputFormat>)
        {
            Some(Ok(format)) => format,
            Some(Err(e)) => {
                log::warn!("{}, writing tsv", e);
                OutputFormat::default()
            }
            None => OutputFormat::default(),
        };

        let mut enzyme = self.enzyme.unwrap_or_default();
        if let Some(name) = enzyme.name.take() {
            match Enzyme::from_name(&name) {
                Some(rule) => enzyme.name = Some(rule.name),
                None if name.is_empty() => {}
                None => log::warn!(
                    "unrecognized enzyme `{}`, expected one of: {}",
                    name,
                    Enzyme::names().collect::<Vec<_>>().join(", ")
                ),
            }
        }
        // Reject malformed custom cleavage rules up front
        EnzymeParameters::try_from(enzyme.clone())?;

        let default = Filter::default();
        let filter = Filter {
            fdr: self.fdr.unwrap_or(default.fdr),
            peptide_probability: self
                .peptide_probability
                .unwrap_or(default.peptide_probability),
            mscore: self.mscore.unwrap_or(default.mscore),
            mscore_peptide_experiment_wide: self
                .mscore_peptide_experiment_wide
                .unwrap_or(default.mscore_peptide_experiment_wide),
            peak_group_rank: self.peak_group_rank.unwrap_or(default.peak_group_rank),
            ignore_decoys: self.ignore_decoys.unwrap_or(default.ignore_decoys),
            decoy_tag: self.decoy_tag.unwrap_or(default.decoy_tag),
        };
        if !(0.0..=1.0).contains(&filter.fdr) {
            log::warn!("fdr is expected to be between 0 and 1, got {}", filter.fdr);
        }
        if !(0.0..=1.0).contains(&filter.peptide_probability) {
            log::warn!(
                "peptide_probability is expected to be between 0 and 1, got {}",
                filter.peptide_probability
            );
        }

        let output_directory = match self.output_directory {
            Some(path) => PathBuf::from(path),
            None => std::env::current_dir()?,
        };

        Ok(Settings {
            version: clap::crate_version!().into(),
            // Presence was checked above
            database: self.database.map(PathBuf::from).unwrap_or_default(),
            file: self.file.map(PathBuf::from).unwrap_or_default(),
            map: self.map.map(PathBuf::from),
            enzyme,
            pipeline,
            filter,
            output_format,
            ignore_invalid: self.ignore_invalid.unwrap_or(false),
            infer_enzyme: self.infer_enzyme.unwrap_or(false),
            output_directory,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::MemoryStorage;

    fn storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.insert("database.fasta", ">p1 gn|ONE:1|\nAAAK\n");
        storage.insert("peptide.txt", "Peptide\nAAAK\n");
        storage
    }

    #[test]
    fn parameters_file() {
        let storage = storage();
        storage.insert(
            "params.json",
            r#"{
                "database": "database.fasta",
                "file": "peptide.txt",
                "enzyme": { "name": "Trypsin", "missed_cleavages": 2 },
                "fdr": 0.05,
                "output": "dsv",
                "peptide_probability": 0.9,
                "mscore_peptide_experiment_wide": 0.05,
                "pipeline": "MSPLIT_DDA",
                "output_directory": "out"
            }"#,
        );
        let settings = Input::load(&storage, "params.json")
            .unwrap()
            .build(&storage)
            .unwrap();
        assert_eq!(settings.database, PathBuf::from("database.fasta"));
        assert_eq!(settings.enzyme.name.as_deref(), Some("trypsin"));
        assert_eq!(settings.enzyme.missed_cleavages, Some(2));
        assert_eq!(settings.filter.fdr, 0.05);
        assert_eq!(settings.filter.peptide_probability, 0.9);
        assert_eq!(settings.filter.mscore_peptide_experiment_wide, 0.05);
        assert_eq!(settings.filter.mscore, 0.01);
        assert_eq!(settings.output_format, OutputFormat::Txt);
        assert_eq!(settings.pipeline, Pipeline::MsplitDda);
        assert_eq!(settings.output_directory, PathBuf::from("out"));
    }

    #[test]
    fn defaults() {
        let storage = storage();
        let input = Input {
            database: Some("database.fasta".into()),
            file: Some("peptide.txt".into()),
            ..Default::default()
        };
        let settings = input.build(&storage).unwrap();
        assert_eq!(settings.filter, Filter::default());
        assert_eq!(settings.enzyme.missed_cleavages, None);
        assert_eq!(settings.output_format, OutputFormat::Tsv);
        assert_eq!(settings.pipeline, Pipeline::Tpp);
        assert!(!settings.ignore_invalid && !settings.infer_enzyme);
    }

    #[test]
    fn missing_inputs() {
        let input = Input {
            enzyme: Some(EnzymeBuilder {
                name: Some("Unknown".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = input.build(&storage()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing FASTA database; missing search result peptide file"
        );

        let input = Input {
            database: Some("other.fasta".into()),
            file: Some("peptide.txt".into()),
            map: Some("genes.tsv".into()),
            ..Default::default()
        };
        let err = input.build(&storage()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "FASTA database `other.fasta` does not exist; gene map `genes.tsv` does not exist"
        );
    }

    #[test]
    fn unrecognized_values() {
        let input = Input {
            database: Some("database.fasta".into()),
            file: Some("peptide.txt".into()),
            enzyme: Some(EnzymeBuilder {
                name: Some("Unknown".into()),
                ..Default::default()
            }),
            output_format: Some("Unknown".into()),
            pipeline: Some("Unknown".into()),
            ..Default::default()
        };
        let settings = input.build(&storage()).unwrap();
        assert_eq!(settings.enzyme.name, None);
        assert_eq!(settings.output_format, OutputFormat::Tsv);
        assert_eq!(settings.pipeline, Pipeline::Tpp);
    }

    #[test]
    fn invalid_custom_enzyme() {
        let input = Input {
            database: Some("database.fasta".into()),
            file: Some("peptide.txt".into()),
            enzyme: Some(EnzymeBuilder {
                cleave_at: Some("K$".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(input.build(&storage()).is_err());
    }
}
