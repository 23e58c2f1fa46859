use clap::{value_parser, Arg, ArgAction, Command, ValueHint};
use pep2gene_cli::input::Input;
use pep2gene_cli::runner::Runner;
use pep2gene_cli::storage::LocalStorage;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("PEP2GENE_LOG", "error,pep2gene=info"))
        .init();

    let matches = Command::new("pep2gene")
        .version(clap::crate_version!())
        .about("Gene-level spectral counts from peptide search results")
        .arg(
            Arg::new("parameters")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to configuration parameters (JSON file)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to FASTA database")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to search results")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("map")
                .long("map")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Tab-separated accession to gene ID and name map")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("enzyme")
                .long("enzyme")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Digestion enzyme (e.g. trypsin). Peptides are matched without digestion if unset")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("missed-cleavages")
                .long("missed-cleavages")
                .value_parser(value_parser!(u8))
                .help("Number of missed cleavages (default = 0)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("pipeline")
                .long("pipeline")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Search pipeline: TPP, MSPLIT_DDA, MSPLIT_DIA, OPENSWATH or SAGE (default = TPP)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("fdr")
                .long("fdr")
                .value_parser(value_parser!(f64))
                .help("Maximum FDR for MSPLIT_DDA and SAGE results (default = 0.01)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("pepprob")
                .long("pepprob")
                .value_parser(value_parser!(f64))
                .help("Minimum PeptideProphet probability for TPP results (default = 0.85)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("mscore")
                .long("mscore")
                .value_parser(value_parser!(f64))
                .help("Maximum m_score for OPENSWATH results (default = 0.01)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("mscore-peptide-experiment-wide")
                .long("mscore-peptide-experiment-wide")
                .value_parser(value_parser!(f64))
                .help("Maximum experiment-wide peptide m_score for OPENSWATH results (default = 0.01)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("peak-group-rank")
                .long("peak-group-rank")
                .value_parser(value_parser!(u32).range(1..))
                .help("Maximum peak group rank for OPENSWATH results (default = 1)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Report format: txt, tsv or json (default = tsv)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("output-directory")
                .short('o')
                .long("output-directory")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Directory the report is written to (default = current directory)")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("ignore-decoys")
                .long("ignore-decoys")
                .action(ArgAction::SetTrue)
                .help("Skip decoy identifications"),
        )
        .arg(
            Arg::new("ignore-invalid")
                .long("ignore-invalid")
                .action(ArgAction::SetTrue)
                .help("Skip database entries without a gene instead of failing"),
        )
        .arg(
            Arg::new("infer-enzyme")
                .long("infer-enzyme")
                .action(ArgAction::SetTrue)
                .help("Use the enzyme declared by the search results if none is set"),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    let storage = LocalStorage;
    let input = Input::from_arguments(matches, &storage)?;
    let parameters = input.build(&storage)?;
    log::debug!("{}", serde_json::to_string_pretty(&parameters)?);

    let output = Runner::new(parameters, &storage).run()?;
    println!("{}", output.display());
    Ok(())
}
