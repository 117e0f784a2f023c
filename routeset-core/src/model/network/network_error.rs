#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("node {0} is not present in the compact graph")]
    InvalidNode(u32),
    #[error("link {link} references node {node}, outside of 0..{n_nodes}")]
    NodeOutOfRange {
        link: usize,
        node: u32,
        n_nodes: usize,
    },
    #[error("link {0} has a non-finite or negative cost: {1}")]
    InvalidCost(usize, f64),
    #[error("graph declares {n_zones} zones but only has {n_nodes} nodes")]
    TooManyZones { n_zones: usize, n_nodes: usize },
    #[error("network expansion for compact link {0} is empty")]
    EmptyExpansion(usize),
    #[error("expected {expected} {collection} entries, found {found}")]
    LengthMismatch {
        collection: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Internal Error: {0}")]
    InternalError(String),
}
