use fnv::FnvHashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

const VALID_AA: &[u8] = b"ACDEFGHIKLMNOPQRSTUVWY";

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
/// An enzymatic digest
pub struct Digest {
    /// Cleaved peptide sequence
    pub sequence: String,
    /// Missed cleavages
    pub missed_cleavages: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
/// Which side of a cleavable residue the enzyme cuts on
pub enum Terminal {
    /// Cut after the residue
    #[serde(alias = "c")]
    C,
    /// Cut before the residue
    #[serde(alias = "n")]
    N,
}

/// Named cleavage rules: (name, cleavable residues, terminal side, do not cut next to)
const RULES: &[(&str, &str, Terminal, Option<char>)] = &[
    ("trypsin", "KR", Terminal::C, Some('P')),
    ("trypsin/p", "KR", Terminal::C, None),
    ("lys-c", "K", Terminal::C, Some('P')),
    ("lys-n", "K", Terminal::N, None),
    ("arg-c", "R", Terminal::C, Some('P')),
    ("asp-n", "D", Terminal::N, None),
    ("glu-c", "E", Terminal::C, Some('P')),
    ("chymotrypsin", "FWY", Terminal::C, Some('P')),
];

#[derive(Clone, Debug)]
pub struct Enzyme {
    pub name: String,
    // Skip cleaving if the cut would separate the site from this AA
    pub skip: Option<char>,
    // Regex for matching cleavage sites
    regex: Regex,
    pub terminal: Terminal,
}

impl Enzyme {
    pub fn new<S: Into<String>>(
        name: S,
        cleave: &str,
        skip: Option<char>,
        terminal: Terminal,
    ) -> Result<Self, Error> {
        if cleave.is_empty() || !cleave.bytes().all(|x| VALID_AA.contains(&x)) {
            return Err(Error::InvalidInput(format!(
                "enzyme cleavage residues must be amino acids: `{}`",
                cleave
            )));
        }
        if let Some(skip) = skip {
            if !skip.is_ascii() || !VALID_AA.contains(&(skip as u8)) {
                return Err(Error::InvalidInput(format!(
                    "enzyme cleavage restriction is not an amino acid: `{}`",
                    skip
                )));
            }
        }
        let regex = Regex::new(&format!("[{}]", cleave))
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Enzyme {
            name: name.into(),
            skip,
            regex,
            terminal,
        })
    }

    /// Look up one of the built-in cleavage rules, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        RULES
            .iter()
            .find(|(rule, ..)| *rule == name)
            .and_then(|&(rule, cleave, terminal, skip)| {
                Enzyme::new(rule, cleave, skip, terminal).ok()
            })
    }

    /// Names of the built-in cleavage rules
    pub fn names() -> impl Iterator<Item = &'static str> {
        RULES.iter().map(|(name, ..)| *name)
    }

    /// Ascending positions of every residue the enzyme cuts at
    pub fn cleavage_sites(&self, sequence: &str) -> Vec<usize> {
        self.regex
            .find_iter(sequence)
            .map(|mat| mat.start())
            .filter(|&site| match self.terminal {
                Terminal::C => match self.skip {
                    Some(skip) => !sequence[site + 1..].starts_with(skip),
                    None => true,
                },
                // Cutting before the first residue produces nothing
                Terminal::N => {
                    site > 0
                        && match self.skip {
                            Some(skip) => !sequence[..site].ends_with(skip),
                            None => true,
                        }
                }
            })
            .collect()
    }
}

/// Split `sequence` at the given cleavage `positions`.
///
/// With [`Terminal::C`] each position is the last residue of a fragment, with
/// [`Terminal::N`] it is the first residue of the next one. Positions must be
/// strictly ascending and inside the sequence. Fragments are returned in
/// sequence order and concatenate back to `sequence`.
pub fn extract_peptides<'s>(
    sequence: &'s str,
    positions: &[usize],
    terminal: Terminal,
) -> Result<Vec<&'s str>, Error> {
    let len = sequence.len();
    if let Some(&pos) = positions.iter().find(|&&pos| pos >= len) {
        return Err(Error::InvalidInput(format!(
            "cleavage position {} is outside of sequence of length {}",
            pos, len
        )));
    }
    if let Some(win) = positions.windows(2).find(|win| win[0] >= win[1]) {
        return Err(Error::InvalidInput(format!(
            "cleavage positions are not strictly ascending: {} then {}",
            win[0], win[1]
        )));
    }

    let mut peptides = Vec::with_capacity(positions.len() + 1);
    let mut start = 0;
    for &pos in positions {
        match terminal {
            Terminal::C => {
                peptides.push(&sequence[start..=pos]);
                start = pos + 1;
            }
            Terminal::N => {
                if pos > start {
                    peptides.push(&sequence[start..pos]);
                }
                start = pos;
            }
        }
    }
    if start < len {
        peptides.push(&sequence[start..]);
    }
    Ok(peptides)
}

pub struct EnzymeParameters {
    /// Number of missed cleavages to produce
    pub missed_cleavages: u8,
    pub enzyme: Option<Enzyme>,
}

impl EnzymeParameters {
    /// Digest a protein sequence into fully cleaved peptides, followed by every
    /// run of up to `missed_cleavages + 1` consecutive fragments. Without an
    /// enzyme the whole sequence is returned.
    pub fn digest(&self, sequence: &str) -> Result<Vec<Digest>, Error> {
        let enzyme = match &self.enzyme {
            Some(enzyme) => enzyme,
            None => {
                return Ok(vec![Digest {
                    sequence: sequence.into(),
                    missed_cleavages: 0,
                }])
            }
        };

        let sites = enzyme.cleavage_sites(sequence);
        let fragments = extract_peptides(sequence, &sites, enzyme.terminal)?;

        let mut ranges = Vec::with_capacity(fragments.len());
        let mut left = 0;
        for fragment in &fragments {
            ranges.push(left..left + fragment.len());
            left += fragment.len();
        }

        // Keep a set of peptides that have been digested from this sequence
        // - handles cases where the same peptide occurs multiple times in a protein
        let mut seen = FnvHashSet::default();
        let mut digests = Vec::new();

        for cleavage in 1..=(1 + self.missed_cleavages as usize) {
            for win in ranges.windows(cleavage) {
                let peptide = &sequence[win[0].start..win[cleavage - 1].end];
                if seen.insert(peptide) {
                    digests.push(Digest {
                        sequence: peptide.into(),
                        missed_cleavages: (cleavage - 1) as u8,
                    });
                }
            }
        }
        Ok(digests)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
/// Enzyme configuration: either a named rule or a custom residue set
pub struct EnzymeBuilder {
    /// Name of a built-in cleavage rule
    pub name: Option<String>,
    /// How many missed cleavages to use
    pub missed_cleavages: Option<u8>,
    pub cleave_at: Option<String>,
    pub restrict: Option<char>,
    pub c_terminal: Option<bool>,
}

impl TryFrom<EnzymeBuilder> for EnzymeParameters {
    type Error = Error;

    fn try_from(en: EnzymeBuilder) -> Result<Self, Self::Error> {
        let enzyme = match (en.name, en.cleave_at) {
            (Some(name), _) if !name.is_empty() => {
                let enzyme = Enzyme::from_name(&name);
                if enzyme.is_none() {
                    log::warn!(
                        "unrecognized enzyme `{}`, peptides will be matched without digestion",
                        name
                    );
                }
                enzyme
            }
            (_, Some(cleave)) if !cleave.is_empty() => {
                let terminal = match en.c_terminal.unwrap_or(true) {
                    true => Terminal::C,
                    false => Terminal::N,
                };
                Some(Enzyme::new("custom", &cleave, en.restrict, terminal)?)
            }
            _ => None,
        };
        Ok(EnzymeParameters {
            missed_cleavages: en.missed_cleavages.unwrap_or(0),
            enzyme,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sequences(digests: Vec<Digest>) -> Vec<String> {
        digests.into_iter().map(|d| d.sequence).collect()
    }

    #[test]
    fn c_terminal_internal_sites() {
        let sequence = "ABCKDEFRPGHIRJLLKKXYZ";
        let expected = vec!["ABCK", "DEFRPGHIR", "JLLK", "K", "XYZ"];
        assert_eq!(
            extract_peptides(sequence, &[3, 12, 16, 17], Terminal::C).unwrap(),
            expected
        );
    }

    #[test]
    fn c_terminal_leading_site() {
        let sequence = "KABCDEFRPGHIRJLLKXYZ";
        let expected = vec!["K", "ABCDEFRPGHIR", "JLLK", "XYZ"];
        assert_eq!(
            extract_peptides(sequence, &[0, 12, 16], Terminal::C).unwrap(),
            expected
        );
    }

    #[test]
    fn c_terminal_trailing_site() {
        let sequence = "ABCKDEFRPGHIRJLLXYZK";
        let expected = vec!["ABCK", "DEFRPGHIR", "JLLXYZK"];
        assert_eq!(
            extract_peptides(sequence, &[3, 12, 19], Terminal::C).unwrap(),
            expected
        );
    }

    #[test]
    fn n_terminal_sites() {
        let sequence = "ABCKDEFRPGHIRJLLKXYZ";
        let expected = vec!["ABC", "KDEFRPGHI", "RJLL", "KXYZ"];
        assert_eq!(
            extract_peptides(sequence, &[3, 12, 16], Terminal::N).unwrap(),
            expected
        );
    }

    #[test]
    fn no_sites() {
        let sequence = "ABCDEF";
        assert_eq!(
            extract_peptides(sequence, &[], Terminal::C).unwrap(),
            vec![sequence]
        );
        assert_eq!(
            extract_peptides(sequence, &[], Terminal::N).unwrap(),
            vec![sequence]
        );
    }

    #[test]
    fn rejects_bad_positions() {
        assert!(matches!(
            extract_peptides("ABCDEF", &[2, 6], Terminal::C),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            extract_peptides("ABCDEF", &[3, 3], Terminal::C),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            extract_peptides("ABCDEF", &[4, 1], Terminal::N),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn trypsin_sites_skip_proline() {
        let trypsin = Enzyme::from_name("Trypsin").unwrap();
        assert_eq!(
            trypsin.cleavage_sites("ABCKDEFRPGHIRJLLKKXYZ"),
            vec![3, 12, 16, 17]
        );
        let trypsin_p = Enzyme::from_name("trypsin/p").unwrap();
        assert_eq!(
            trypsin_p.cleavage_sites("ABCKDEFRPGHIRJLLKKXYZ"),
            vec![3, 7, 12, 16, 17]
        );
    }

    #[test]
    fn unknown_enzyme() {
        assert!(Enzyme::from_name("pepsin-x").is_none());
        assert!(Enzyme::new("bad", "K1", None, Terminal::C).is_err());
        assert!(Enzyme::new("bad", "K", Some('#'), Terminal::C).is_err());
        // U+0141 truncates to b'A'
        assert!(Enzyme::new("bad", "K", Some('Ł'), Terminal::C).is_err());
        assert!(Enzyme::new("bad", "K", Some('ŀ'), Terminal::C).is_err());
    }

    #[test]
    fn trypsin() {
        let sequence = "MADEEKLPPGWEKRMSRSSGRVYYFNHITNASQWERPSGN";
        let expected = vec![
            "MADEEK",
            "LPPGWEK",
            "R",
            "MSR",
            "SSGR",
            "VYYFNHITNASQWERPSGN",
        ];

        let tryp = EnzymeParameters {
            missed_cleavages: 0,
            enzyme: Enzyme::from_name("trypsin"),
        };

        assert_eq!(expected, sequences(tryp.digest(sequence).unwrap()));
    }

    #[test]
    fn trypsin_missed_cleavage_2() {
        let sequence = "MADEEKLPPGWEKRMSRSSGRVYYFNHITNASQWERPSGN";
        let expected = vec![
            "MADEEK",
            "LPPGWEK",
            "R",
            "MSR",
            "SSGR",
            "VYYFNHITNASQWERPSGN",
            "MADEEKLPPGWEK",
            "LPPGWEKR",
            "RMSR",
            "MSRSSGR",
            "SSGRVYYFNHITNASQWERPSGN",
            "MADEEKLPPGWEKR",
            "LPPGWEKRMSR",
            "RMSRSSGR",
            "MSRSSGRVYYFNHITNASQWERPSGN",
        ];

        let tryp = EnzymeParameters {
            missed_cleavages: 2,
            enzyme: Enzyme::from_name("trypsin"),
        };

        let digests = tryp.digest(sequence).unwrap();
        assert_eq!(digests[6].missed_cleavages, 1);
        assert_eq!(digests[11].missed_cleavages, 2);
        assert_eq!(expected, sequences(digests));
    }

    #[test]
    fn asp_n() {
        let sequence = "MADEEKLPPGWEKRMSRSSGRVYYFNHITNASQWERPSGNW";
        let expected = vec!["MA", "DEEKLPPGWEKRMSRSSGRVYYFNHITNASQWERPSGNW"];

        let asp_n = EnzymeParameters {
            missed_cleavages: 0,
            enzyme: Enzyme::from_name("asp-n"),
        };

        assert_eq!(expected, sequences(asp_n.digest(sequence).unwrap()));
    }

    #[test]
    fn leading_n_terminal_site() {
        let lys_n = Enzyme::from_name("lys-n").unwrap();
        assert_eq!(lys_n.cleavage_sites("KAAKBB"), vec![3]);
        assert_eq!(
            extract_peptides("KAAKBB", &[0, 3], Terminal::N).unwrap(),
            vec!["KAA", "KBB"]
        );
    }

    #[test]
    fn no_digest() {
        let sequence = "MADEEKLPPGWEKRMSRSSGRVYYFNHITNASQWERPSGNW";
        let params = EnzymeParameters {
            missed_cleavages: 3,
            enzyme: None,
        };
        assert_eq!(vec![sequence], sequences(params.digest(sequence).unwrap()));
    }

    #[test]
    fn ensure_unique() {
        let sequence = "VEGAQNQGKVEGAQNQGK";
        let expected = vec!["VEGAQNQGK"];

        let params = EnzymeParameters {
            missed_cleavages: 0,
            enzyme: Enzyme::new("custom", "KR", None, Terminal::C).ok(),
        };

        assert_eq!(expected, sequences(params.digest(sequence).unwrap()));
    }

    #[test]
    fn builder() {
        let params = EnzymeParameters::try_from(EnzymeBuilder {
            name: Some("LYS-C".into()),
            missed_cleavages: Some(1),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(params.missed_cleavages, 1);
        assert_eq!(params.enzyme.unwrap().name, "lys-c");

        let params = EnzymeParameters::try_from(EnzymeBuilder {
            cleave_at: Some("D".into()),
            c_terminal: Some(false),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(params.enzyme.unwrap().terminal, Terminal::N);

        let params = EnzymeParameters::try_from(EnzymeBuilder {
            name: Some("unknown".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(params.enzyme.is_none());
    }
}
