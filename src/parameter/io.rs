use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::parameter::Parameter;
use crate::persist::{self, tsv};

const WEIGHT_PREFIX: &str = "weight ";
const BIAS_PREFIX: &str = "bias ";
const SUFFIX: &str = ".csv";

impl Parameter {
    /// Writes `weight <n>.csv` and `bias <n>.csv` for every layer, 1-indexed,
    /// creating `dir` if needed. Layer files beyond this parameter's layer
    /// count are deleted.
    pub fn write_to_dir(&self, dir: &Path) -> Result<()> {
        persist::create_dir(dir)?;
        persist::remove_numbered_entries_after(dir, WEIGHT_PREFIX, SUFFIX, self.layer_count())?;
        persist::remove_numbered_entries_after(dir, BIAS_PREFIX, SUFFIX, self.layer_count())?;
        for (i, (weight, bias)) in self.weights.iter().zip(&self.biases).enumerate() {
            let n = i + 1;
            tsv::write_matrix(&dir.join(format!("{WEIGHT_PREFIX}{n}{SUFFIX}")), weight)?;
            tsv::write_vector(&dir.join(format!("{BIAS_PREFIX}{n}{SUFFIX}")), bias)?;
        }
        debug!(dir = %dir.display(), layers = self.layer_count(), "wrote parameter");
        Ok(())
    }

    /// Reads a parameter written by [`Parameter::write_to_dir`]. Layers are
    /// ordered by their numeric suffix, so `weight 10.csv` follows
    /// `weight 9.csv`.
    pub fn read_from_dir(dir: &Path) -> Result<Parameter> {
        let weight_files = persist::numbered_entries(dir, WEIGHT_PREFIX, SUFFIX)?;
        let bias_files = persist::numbered_entries(dir, BIAS_PREFIX, SUFFIX)?;
        if weight_files.len() != bias_files.len() {
            return Err(Error::format(
                dir,
                format!(
                    "found {} weight files but {} bias files",
                    weight_files.len(),
                    bias_files.len()
                ),
            ));
        }
        if weight_files.is_empty() {
            return Err(Error::NotFound(dir.join(format!("{WEIGHT_PREFIX}1{SUFFIX}"))));
        }

        let weights = weight_files
            .iter()
            .map(|(_, path)| tsv::read_matrix(path))
            .collect::<Result<Vec<_>>>()?;
        let biases = bias_files
            .iter()
            .map(|(_, path)| tsv::read_vector(path))
            .collect::<Result<Vec<_>>>()?;
        debug!(dir = %dir.display(), layers = weights.len(), "read parameter");
        Parameter::new(weights, biases)
    }
}
