use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use crate::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Protein {
    pub accession: String,
    pub gene_id: String,
    pub gene_name: String,
    pub sequence: String,
}

/// Protein accession to (gene ID, gene name), read from a tab-separated file
#[derive(Clone, Debug, Default)]
pub struct GeneMap {
    entries: HashMap<String, (String, String)>,
}

impl GeneMap {
    /// Parse `accession<TAB>gene id<TAB>gene name` lines. A missing name
    /// column reuses the gene ID; lines starting with `#` are ignored.
    pub fn parse<R: Read>(reader: R) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut entries = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let accession = record.get(0).map(str::trim).unwrap_or_default();
            let gene_id = record.get(1).map(str::trim).unwrap_or_default();
            if accession.is_empty() || gene_id.is_empty() {
                continue;
            }
            let gene_name = record
                .get(2)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(gene_id);
            entries.insert(accession.into(), (gene_id.into(), gene_name.into()));
        }
        Ok(GeneMap { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Try the full accession, then each `|`-separated piece of it
    fn get(&self, accession: &str) -> Option<&(String, String)> {
        self.entries
            .get(accession)
            .or_else(|| accession.split('|').find_map(|piece| self.entries.get(piece)))
    }
}

struct HeaderParser {
    gingras: Regex,
    uniprot: Regex,
}

impl HeaderParser {
    fn new() -> Self {
        HeaderParser {
            gingras: Regex::new(r"gn\|([^:|]+):([^|\s]+)").expect("valid regex"),
            uniprot: Regex::new(r"\bGN=(\S+)").expect("valid regex"),
        }
    }

    /// Gene (ID, name) from a header line
    fn gene(&self, header: &str) -> Option<(String, String)> {
        if let Some(caps) = self.gingras.captures(header) {
            return Some((caps[2].to_string(), caps[1].to_string()));
        }
        self.uniprot
            .captures(header)
            .map(|caps| (caps[1].to_string(), caps[1].to_string()))
    }
}

pub struct Fasta {
    pub proteins: Vec<Protein>,
}

impl Fasta {
    /// Parse a string into a protein database, assigning every entry to a gene.
    ///
    /// Genes come from `gene_map` when it has the accession, otherwise from the header. Entries
    /// whose accession contains `decoy_tag` are dropped. Entries without a gene
    /// are an error unless `ignore_invalid` is set.
    pub fn parse(
        contents: &str,
        decoy_tag: &str,
        gene_map: Option<&GeneMap>,
        ignore_invalid: bool,
    ) -> Result<Fasta, Error> {
        let parser = HeaderParser::new();
        let mut proteins = Vec::new();
        let mut skipped = 0;

        let mut entries = Vec::new();
        let mut header: Option<&str> = None;
        let mut s = String::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(id) = line.strip_prefix('>') {
                if let Some(header) = header {
                    entries.push((header, std::mem::take(&mut s)));
                }
                header = Some(id);
            } else {
                s.push_str(line.trim_end_matches('*'));
            }
        }
        if let Some(header) = header {
            entries.push((header, s));
        }

        for (header, sequence) in entries {
            let accession = header.split_ascii_whitespace().next().unwrap_or_default();
            if !decoy_tag.is_empty() && accession.contains(decoy_tag) {
                continue;
            }
            if sequence.is_empty() {
                log::warn!("skipping database entry `{}` without a sequence", accession);
                continue;
            }
            let gene = gene_map
                .and_then(|map| map.get(accession).cloned())
                .or_else(|| parser.gene(header));
            match gene {
                Some((gene_id, gene_name)) => proteins.push(Protein {
                    accession: accession.into(),
                    gene_id,
                    gene_name,
                    sequence: sequence.to_ascii_uppercase(),
                }),
                None if ignore_invalid => skipped += 1,
                None => return Err(Error::InvalidGene(header.into())),
            }
        }

        if skipped > 0 {
            log::warn!("skipped {} database entries without a gene", skipped);
        }
        Ok(Fasta { proteins })
    }

    /// Gene ID to display name; the first name seen for an ID wins
    pub fn gene_names(&self) -> BTreeMap<String, String> {
        let mut names = BTreeMap::new();
        for protein in &self.proteins {
            names
                .entry(protein.gene_id.clone())
                .or_insert_with(|| protein.gene_name.clone());
        }
        names
    }
}
