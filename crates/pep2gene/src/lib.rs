pub mod enzyme;
pub mod fasta;
pub mod inference;
pub mod mapping;
pub mod peptide;
pub mod report;
pub mod search;

/// A gene or a peptide in the evidence graph
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Gene(String),
    Peptide(String),
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Gene(id) => write!(f, "gene `{}`", id),
            Node::Peptide(seq) => write!(f, "peptide `{}`", seq),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// Malformed cleavage positions or enzyme definition
    InvalidInput(String),
    /// A peptide names a candidate gene that is not in the gene map
    DanglingReference { peptide: String, gene: String },
    /// A gene or peptide without any backing evidence
    NoEvidence(Node),
    /// A database entry that could not be assigned to a gene
    InvalidGene(String),
    /// A search result file that could not be understood
    Malformed(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Xml(quick_xml::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(s) => write!(f, "invalid input: {}", s),
            Self::DanglingReference { peptide, gene } => write!(
                f,
                "peptide `{}` references gene `{}`, which is not in the gene map",
                peptide, gene
            ),
            Self::NoEvidence(node) => write!(f, "no evidence for {}", node),
            Self::InvalidGene(header) => {
                write!(f, "could not determine a gene for database entry `{}`", header)
            }
            Self::Malformed(s) => write!(f, "malformed search results: {}", s),
            Self::Io(e) => e.fmt(f),
            Self::Csv(e) => e.fmt(f),
            Self::Xml(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(residual: std::io::Error) -> Self {
        Self::Io(residual)
    }
}

impl From<csv::Error> for Error {
    fn from(residual: csv::Error) -> Self {
        Self::Csv(residual)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(residual: quick_xml::Error) -> Self {
        Self::Xml(residual)
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(residual: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(residual.into())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(residual: std::str::Utf8Error) -> Self {
        Self::Malformed(residual.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(residual: std::num::ParseFloatError) -> Self {
        Self::Malformed(residual.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(residual: std::num::ParseIntError) -> Self {
        Self::Malformed(residual.to_string())
    }
}
