use arrow::array::{Array, Float32Array, Float64Array, RecordBatch, UInt32Array};
use indexmap::IndexMap;

use super::{ColumnValues, DemandError};

pub const ORIGIN_COLUMN: &str = "origin_id";
pub const DESTINATION_COLUMN: &str = "destination_id";

/// A generalized sparse OD demand container.
///
/// Rows are `(origin, destination)` pairs keyed by external network node
/// ids; columns are named f32 or f64 demand values. Frames, dense
/// matrices and arrow record batches can be unioned in; missing values
/// fill to zero. `finalize` produces the column-major layout the
/// assignment engine iterates.
#[derive(Debug, Clone, Default)]
pub struct DemandTable {
    pairs: IndexMap<(u32, u32), usize>,
    columns: IndexMap<String, ColumnValues>,
}

impl DemandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `true` when no column carries any demand.
    pub fn no_demand(&self) -> bool {
        self.columns.values().all(|column| column.total() == 0.0)
    }

    /// the row of an OD pair, creating it (and zero-filling every
    /// existing column) if new.
    fn row(&mut self, pair: (u32, u32)) -> usize {
        let next = self.pairs.len();
        match self.pairs.entry(pair) {
            indexmap::map::Entry::Occupied(entry) => *entry.get(),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(next);
                for column in self.columns.values_mut() {
                    column.push(0.0);
                }
                next
            }
        }
    }

    fn check_new_column(&self, name: &str) -> Result<(), DemandError> {
        if self.columns.contains_key(name) {
            return Err(DemandError::DuplicateDemandColumn(name.to_string()));
        }
        Ok(())
    }

    /// Union an indexed frame of OD pairs and named columns into the
    /// table. Values of a column are aligned with `pairs`; pairs absent
    /// from this frame keep (or get) zero in the new columns, and pairs
    /// new to the table get zero in the previously added columns.
    ///
    /// A pair repeated within one frame is collapsed with a warning; the
    /// last occurrence wins.
    pub fn add_frame(
        &mut self,
        pairs: &[(u32, u32)],
        columns: Vec<(String, ColumnValues)>,
    ) -> Result<(), DemandError> {
        for (name, values) in &columns {
            self.check_new_column(name)?;
            if values.len() != pairs.len() {
                return Err(DemandError::LengthMismatch {
                    name: name.clone(),
                    expected: pairs.len(),
                    found: values.len(),
                });
            }
        }
        let mut seen_names = IndexMap::new();
        for (name, _) in &columns {
            if seen_names.insert(name.clone(), ()).is_some() {
                return Err(DemandError::DuplicateDemandColumn(name.clone()));
            }
        }

        let mut rows = Vec::with_capacity(pairs.len());
        let before = self.pairs.len();
        for &pair in pairs {
            let existing = self.pairs.len();
            let row = self.row(pair);
            if row < existing && row >= before {
                log::warn!(
                    "duplicate OD pair ({}, {}) in demand frame; keeping the last value",
                    pair.0,
                    pair.1
                );
            }
            rows.push(row);
        }

        let n_rows = self.pairs.len();
        for (name, values) in columns {
            let mut column = values.zeros_like(n_rows);
            for (i, &row) in rows.iter().enumerate() {
                column.set(row, values.get(i));
            }
            self.columns.insert(name, column);
        }
        Ok(())
    }

    /// Union a dense `n x n` OD matrix over `zone_ids` as one f64 column,
    /// dropping zero and NaN cells before the union.
    pub fn add_dense_matrix(
        &mut self,
        name: &str,
        zone_ids: &[u32],
        matrix: &[f64],
    ) -> Result<(), DemandError> {
        let n = zone_ids.len();
        if matrix.len() != n * n {
            return Err(DemandError::MatrixShape {
                name: name.to_string(),
                n_zones: n,
                expected: n * n,
                found: matrix.len(),
            });
        }
        let mut pairs = Vec::new();
        let mut values = Vec::new();
        for (i, &origin) in zone_ids.iter().enumerate() {
            for (j, &destination) in zone_ids.iter().enumerate() {
                let value = matrix[i * n + j];
                if value == 0.0 || value.is_nan() {
                    continue;
                }
                pairs.push((origin, destination));
                values.push(value);
            }
        }
        self.add_frame(&pairs, vec![(name.to_string(), ColumnValues::F64(values))])
    }

    /// Union an arrow record batch with `origin_id` / `destination_id`
    /// UInt32 index columns and any number of Float32/Float64 demand
    /// columns. Nulls fill to zero; any other column type is a
    /// [`DemandError::TypeMismatch`].
    pub fn add_record_batch(&mut self, batch: &RecordBatch) -> Result<(), DemandError> {
        let origins = index_column(batch, ORIGIN_COLUMN)?;
        let destinations = index_column(batch, DESTINATION_COLUMN)?;
        let pairs: Vec<(u32, u32)> = origins
            .iter()
            .zip(destinations.iter())
            .map(|(o, d)| (o.unwrap_or(0), d.unwrap_or(0)))
            .collect();

        let mut columns = Vec::new();
        for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
            let name = field.name();
            if name == ORIGIN_COLUMN || name == DESTINATION_COLUMN {
                continue;
            }
            let values = if let Some(array) = column.as_any().downcast_ref::<Float64Array>() {
                ColumnValues::F64(array.iter().map(|v| v.unwrap_or(0.0)).collect())
            } else if let Some(array) = column.as_any().downcast_ref::<Float32Array>() {
                ColumnValues::F32(array.iter().map(|v| v.unwrap_or(0.0)).collect())
            } else {
                return Err(DemandError::TypeMismatch {
                    name: name.clone(),
                    dtype: format!("{:?}", field.data_type()),
                });
            };
            columns.push((name.clone(), values));
        }
        self.add_frame(&pairs, columns)
    }

    /// Column-major layout: OD pairs sorted by (origin, destination) and
    /// each column's values aligned with that order.
    pub fn finalize(&self) -> FinalizedDemand {
        let mut order: Vec<usize> = (0..self.pairs.len()).collect();
        let pairs: Vec<(u32, u32)> = self.pairs.keys().copied().collect();
        order.sort_by_key(|&row| pairs[row]);

        let ods: Vec<(u32, u32)> = order.iter().map(|&row| pairs[row]).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let mut sorted = values.zeros_like(ods.len());
                for (new_row, &old_row) in order.iter().enumerate() {
                    sorted.set(new_row, values.get(old_row));
                }
                (name.clone(), sorted)
            })
            .collect();
        FinalizedDemand { ods, columns }
    }
}

fn index_column(batch: &RecordBatch, name: &str) -> Result<UInt32Array, DemandError> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| DemandError::MissingColumn(name.to_string()))?;
    column
        .as_any()
        .downcast_ref::<UInt32Array>()
        .cloned()
        .ok_or_else(|| DemandError::TypeMismatch {
            name: name.to_string(),
            dtype: format!("{:?}", column.data_type()),
        })
}

/// The frozen, column-major demand view a batch runs against.
#[derive(Debug, Clone)]
pub struct FinalizedDemand {
    ods: Vec<(u32, u32)>,
    columns: IndexMap<String, ColumnValues>,
}

impl FinalizedDemand {
    pub fn ods(&self) -> &[(u32, u32)] {
        &self.ods
    }

    pub fn n_pairs(&self) -> usize {
        self.ods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ods.is_empty()
    }

    pub fn no_demand(&self) -> bool {
        self.columns.values().all(|column| column.total() == 0.0)
    }

    pub fn columns(&self) -> &IndexMap<String, ColumnValues> {
        &self.columns
    }

    /// demand for one OD row in one column, as f64 regardless of the
    /// column dtype.
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.columns[column].get(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_union_fills_missing_with_zero() {
        let mut table = DemandTable::new();
        table
            .add_frame(
                &[(1, 2), (1, 3)],
                vec![("car".to_string(), ColumnValues::F64(vec![10.0, 20.0]))],
            )
            .unwrap();
        table
            .add_frame(
                &[(1, 3), (4, 2)],
                vec![("truck".to_string(), ColumnValues::F32(vec![1.0, 2.0]))],
            )
            .unwrap();

        let demand = table.finalize();
        assert_eq!(demand.ods(), &[(1, 2), (1, 3), (4, 2)]);
        // car has no (4, 2) entry, truck has no (1, 2) entry
        assert_eq!(demand.value(0, 0), 10.0);
        assert_eq!(demand.value(2, 0), 0.0);
        assert_eq!(demand.value(0, 1), 0.0);
        assert_eq!(demand.value(1, 1), 1.0);
        assert_eq!(demand.columns()[1].dtype(), "f32");
    }

    #[test]
    fn test_finalize_sorts_by_origin_destination() {
        let mut table = DemandTable::new();
        table
            .add_frame(
                &[(9, 1), (2, 5), (2, 3)],
                vec![("d".to_string(), ColumnValues::F64(vec![1.0, 2.0, 3.0]))],
            )
            .unwrap();
        let demand = table.finalize();
        assert_eq!(demand.ods(), &[(2, 3), (2, 5), (9, 1)]);
        assert_eq!(demand.value(0, 0), 3.0);
        assert_eq!(demand.value(2, 0), 1.0);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut table = DemandTable::new();
        table
            .add_frame(
                &[(1, 2)],
                vec![("car".to_string(), ColumnValues::F64(vec![1.0]))],
            )
            .unwrap();
        let result = table.add_frame(
            &[(1, 2)],
            vec![("car".to_string(), ColumnValues::F64(vec![2.0]))],
        );
        assert!(matches!(
            result,
            Err(DemandError::DuplicateDemandColumn(name)) if name == "car"
        ));
    }

    #[test]
    fn test_duplicate_pair_collapsed() {
        let mut table = DemandTable::new();
        table
            .add_frame(
                &[(1, 2), (1, 2)],
                vec![("d".to_string(), ColumnValues::F64(vec![1.0, 5.0]))],
            )
            .unwrap();
        assert_eq!(table.n_pairs(), 1);
        let demand = table.finalize();
        assert_eq!(demand.value(0, 0), 5.0);
    }

    #[test]
    fn test_dense_matrix_drops_zeros_and_nans() {
        let mut table = DemandTable::new();
        let matrix = vec![
            0.0,
            7.0,
            f64::NAN, //
            0.0,
            0.0,
            3.0, //
            1.0,
            0.0,
            0.0,
        ];
        table.add_dense_matrix("d", &[10, 20, 30], &matrix).unwrap();
        let demand = table.finalize();
        assert_eq!(demand.ods(), &[(10, 20), (20, 30), (30, 10)]);
        assert_eq!(demand.value(0, 0), 7.0);
        assert_eq!(demand.value(1, 0), 3.0);
        assert_eq!(demand.value(2, 0), 1.0);
    }

    #[test]
    fn test_dense_matrix_shape_checked() {
        let mut table = DemandTable::new();
        let result = table.add_dense_matrix("d", &[1, 2], &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(DemandError::MatrixShape { .. })));
    }

    #[test]
    fn test_record_batch_ingestion() {
        let batch = RecordBatch::try_from_iter(vec![
            (
                ORIGIN_COLUMN,
                Arc::new(UInt32Array::from(vec![1, 1])) as arrow::array::ArrayRef,
            ),
            (
                DESTINATION_COLUMN,
                Arc::new(UInt32Array::from(vec![2, 3])),
            ),
            ("car", Arc::new(Float64Array::from(vec![5.0, 6.0]))),
            ("bike", Arc::new(Float32Array::from(vec![0.5, 0.25]))),
        ])
        .unwrap();
        let mut table = DemandTable::new();
        table.add_record_batch(&batch).unwrap();
        let demand = table.finalize();
        assert_eq!(demand.n_pairs(), 2);
        assert_eq!(demand.value(1, 0), 6.0);
        assert_eq!(demand.value(1, 1), 0.25);
        assert_eq!(demand.columns()[1].dtype(), "f32");
    }

    #[test]
    fn test_record_batch_type_mismatch() {
        let batch = RecordBatch::try_from_iter(vec![
            (
                ORIGIN_COLUMN,
                Arc::new(UInt32Array::from(vec![1])) as arrow::array::ArrayRef,
            ),
            (DESTINATION_COLUMN, Arc::new(UInt32Array::from(vec![2]))),
            (
                "label",
                Arc::new(arrow::array::StringArray::from(vec!["x"])),
            ),
        ])
        .unwrap();
        let mut table = DemandTable::new();
        assert!(matches!(
            table.add_record_batch(&batch),
            Err(DemandError::TypeMismatch { name, .. }) if name == "label"
        ));
    }

    #[test]
    fn test_no_demand() {
        let mut table = DemandTable::new();
        assert!(table.is_empty());
        assert!(table.no_demand());
        table
            .add_frame(
                &[(1, 2)],
                vec![("d".to_string(), ColumnValues::F64(vec![0.0]))],
            )
            .unwrap();
        assert!(!table.is_empty());
        assert!(table.no_demand());
    }
}
