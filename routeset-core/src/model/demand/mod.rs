mod column_values;
mod demand_error;
mod demand_table;

pub use column_values::ColumnValues;
pub use demand_error::DemandError;
pub use demand_table::{DemandTable, FinalizedDemand, DESTINATION_COLUMN, ORIGIN_COLUMN};
