#[derive(thiserror::Error, Debug)]
pub enum DemandError {
    #[error("demand column '{0}' already exists")]
    DuplicateDemandColumn(String),
    #[error("demand column '{name}' has unsupported type {dtype}; expected Float32 or Float64")]
    TypeMismatch { name: String, dtype: String },
    #[error("record batch is missing the required '{0}' column")]
    MissingColumn(String),
    #[error("demand column '{name}' has {found} values for {expected} OD pairs")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("dense matrix for '{name}' must hold {expected} values for {n_zones} zones, found {found}")]
    MatrixShape {
        name: String,
        n_zones: usize,
        expected: usize,
        found: usize,
    },
}
