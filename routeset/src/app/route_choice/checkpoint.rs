use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::RouteChoiceError;

/// Writes route-set batches as a parquet dataset partitioned by origin,
/// one Hive-style `origin_id=<n>/part-0.parquet` directory per origin.
///
/// Re-running a batch overwrites its partitions in place, so a partially
/// written dataset can be repaired by running the same batch again.
pub struct CheckpointWriter {
    root: PathBuf,
}

impl CheckpointWriter {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RouteChoiceError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// write (or overwrite) one origin's partition.
    pub fn write_origin(
        &self,
        origin: u32,
        batch: &RecordBatch,
    ) -> Result<PathBuf, RouteChoiceError> {
        let partition = self.root.join(format!("origin_id={origin}"));
        std::fs::create_dir_all(&partition)?;
        let path = partition.join("part-0.parquet");
        let file = File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
        writer.write(batch)?;
        writer.close()?;
        Ok(path)
    }
}

/// Read-back of a dataset written by [`CheckpointWriter`].
pub struct CheckpointDataset;

impl CheckpointDataset {
    /// all partitions of the dataset, ordered by origin id.
    pub fn read_all(root: impl AsRef<Path>) -> Result<Vec<RecordBatch>, RouteChoiceError> {
        let root = root.as_ref();
        let mut partitions: Vec<(u32, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(origin) = name.strip_prefix("origin_id=") else {
                continue;
            };
            let origin: u32 = origin.parse().map_err(|_| {
                RouteChoiceError::Checkpoint(format!(
                    "partition directory '{name}' has a malformed origin id"
                ))
            })?;
            partitions.push((origin, entry.path().join("part-0.parquet")));
        }
        partitions.sort();

        let mut batches = Vec::new();
        for (_, path) in partitions {
            let file = File::open(path)?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
            for batch in reader {
                batches.push(batch?);
            }
        }
        Ok(batches)
    }

    /// the whole dataset concatenated into one table.
    pub fn read_table(root: impl AsRef<Path>) -> Result<RecordBatch, RouteChoiceError> {
        let batches = Self::read_all(root)?;
        let Some(first) = batches.first() else {
            return Err(RouteChoiceError::Checkpoint(
                "dataset holds no partitions".to_string(),
            ));
        };
        arrow::compute::concat_batches(&first.schema(), &batches).map_err(RouteChoiceError::from)
    }
}
