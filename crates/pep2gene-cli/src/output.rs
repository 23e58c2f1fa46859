use pep2gene_core::report::GeneSummary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `;;` delimited hit listing
    Txt,
    #[default]
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Tsv => "tsv",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "dsv" => Ok(Self::Txt),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format `{}`", s)),
        }
    }
}

/// Everything written to a report: run parameters and the per-gene summary
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enzyme: Option<String>,
    pub fdr: f64,
    pub file: String,
    pub genes: &'a BTreeMap<String, GeneSummary>,
    pub missed_cleavages: u8,
    pub peptide_probability: f64,
    pub pipeline: String,
    /// Observed peptides no gene in the database can produce
    pub unmatched: &'a [String],
}

impl Report<'_> {
    pub fn serialize(&self, format: OutputFormat) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        match format {
            OutputFormat::Txt => write_txt(&mut bytes, self.genes)?,
            OutputFormat::Tsv => write_tsv(&mut bytes, self.genes)?,
            OutputFormat::Json => serde_json::to_writer_pretty(&mut bytes, self)?,
        }
        Ok(bytes)
    }
}

/// Genes in report order: spectral count descending, then name
fn hits(genes: &BTreeMap<String, GeneSummary>) -> Vec<(&String, &GeneSummary)> {
    let mut hits = genes.iter().collect::<Vec<_>>();
    hits.sort_by(|(_, a), (_, b)| {
        b.spectral_count
            .total_cmp(&a.spectral_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    hits
}

fn joined<'a, I: IntoIterator<Item = &'a String>>(first: &'a String, rest: I) -> String {
    std::iter::once(first)
        .chain(rest)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn write_txt<W: Write>(mut w: W, genes: &BTreeMap<String, GeneSummary>) -> std::io::Result<()> {
    w.write_all(b"HitNumber;;Gene;;GeneID;;SpectralCount;;Unique;;Subsumed\n")?;
    w.write_all(b"Peptide;;TotalSpectralCount;;IsUnique\n")?;
    for (ix, (id, gene)) in hits(genes).into_iter().enumerate() {
        writeln!(
            w,
            "\nHit_{};;{};;{};;{:.2};;{};;{}",
            ix + 1,
            joined(&gene.name, &gene.shared_names),
            joined(id, &gene.shared_ids),
            gene.spectral_count,
            gene.unique,
            gene.subsumed.join(", ")
        )?;
        for (form, peptide) in &gene.peptides {
            let unique = match peptide.unique {
                true => "yes",
                false => "no",
            };
            writeln!(w, "{};;{};;{}", form, peptide.total_spectral_count, unique)?;
        }
    }
    Ok(())
}

pub fn write_tsv<W: Write>(w: W, genes: &BTreeMap<String, GeneSummary>) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(w);

    let headers = csv::ByteRecord::from(vec![
        "gene",
        "gene_id",
        "spectral_count",
        "unique",
        "unique_shared",
        "shared_genes",
        "shared_ids",
        "subsumed",
        "peptides",
    ]);
    wtr.write_byte_record(&headers)?;

    for (id, gene) in hits(genes) {
        let mut record = csv::ByteRecord::new();
        record.push_field(gene.name.as_bytes());
        record.push_field(id.as_bytes());
        record.push_field(ryu::Buffer::new().format(gene.spectral_count).as_bytes());
        record.push_field(itoa::Buffer::new().format(gene.unique).as_bytes());
        record.push_field(itoa::Buffer::new().format(gene.unique_shared).as_bytes());
        record.push_field(gene.shared_names.join(";").as_bytes());
        record.push_field(gene.shared_ids.join(";").as_bytes());
        record.push_field(gene.subsumed.join(";").as_bytes());
        record.push_field(
            gene.peptides
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(";")
                .as_bytes(),
        );
        wtr.write_byte_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pep2gene_core::report::PeptideSummary;

    fn peptide(allotted: f64, total: f64, unique: bool, unique_shared: bool) -> PeptideSummary {
        PeptideSummary {
            allotted_spectral_count: allotted,
            total_spectral_count: total,
            unique,
            unique_shared,
        }
    }

    fn genes() -> BTreeMap<String, GeneSummary> {
        let mut genes = BTreeMap::new();
        genes.insert(
            "1".to_string(),
            GeneSummary {
                name: "one".into(),
                peptides: vec![("AAA".to_string(), peptide(4.0, 4.0, true, false))]
                    .into_iter()
                    .collect(),
                shared_ids: vec![],
                shared_names: vec![],
                spectral_count: 5.0,
                subsumed: vec!["4".into()],
                unique: 1,
                unique_shared: 0,
            },
        );
        genes.insert(
            "2".to_string(),
            GeneSummary {
                name: "two".into(),
                peptides: vec![
                    ("BBB".to_string(), peptide(1.0, 3.0, false, false)),
                    ("CCC[115]".to_string(), peptide(2.0, 4.0, false, true)),
                ]
                .into_iter()
                .collect(),
                shared_ids: vec!["3".into()],
                shared_names: vec!["three".into()],
                spectral_count: 3.0,
                subsumed: vec![],
                unique: 0,
                unique_shared: 1,
            },
        );
        genes
    }

    #[test]
    fn txt() {
        let mut out = Vec::new();
        write_txt(&mut out, &genes()).unwrap();
        let expected = "HitNumber;;Gene;;GeneID;;SpectralCount;;Unique;;Subsumed\n\
                        Peptide;;TotalSpectralCount;;IsUnique\n\n\
                        Hit_1;;one;;1;;5.00;;1;;4\n\
                        AAA;;4;;yes\n\n\
                        Hit_2;;two, three;;2, 3;;3.00;;0;;\n\
                        BBB;;3;;no\n\
                        CCC[115];;4;;no\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn tsv() {
        let mut out = Vec::new();
        write_tsv(&mut out, &genes()).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("gene\tgene_id\tspectral_count"));
        assert_eq!(lines[1], "one\t1\t5.0\t1\t0\t\t\t4\tAAA");
        assert_eq!(lines[2], "two\t2\t3.0\t0\t1\tthree\t3\t\tBBB;CCC[115]");
    }

    #[test]
    fn ties_ordered_by_name() {
        let mut genes = genes();
        if let Some(two) = genes.get_mut("2") {
            two.spectral_count = 5.0;
            two.name = "alpha".into();
        }
        let order = hits(&genes)
            .into_iter()
            .map(|(id, _)| id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["2", "1"]);
    }

    #[test]
    fn json() {
        let genes = genes();
        let report = Report {
            database: "database.fasta".into(),
            enzyme: Some("trypsin".into()),
            fdr: 0.01,
            file: "file.txt".into(),
            genes: &genes,
            missed_cleavages: 2,
            peptide_probability: 0.85,
            pipeline: "TPP".into(),
            unmatched: &[],
        };
        let bytes = report.serialize(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["enzyme"], "trypsin");
        assert_eq!(value["missedCleavages"], 2);
        assert_eq!(value["genes"]["2"]["sharedIDs"][0], "3");
        assert_eq!(
            value["genes"]["2"]["peptides"]["CCC[115]"]["allottedSpectralCount"],
            2.0
        );
    }

    #[test]
    fn parse_format() {
        assert_eq!("DSV".parse::<OutputFormat>(), Ok(OutputFormat::Txt));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }
}
