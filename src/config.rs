use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct BenchConfig {
    /// Directory holding the benchmark databases
    pub data_dir: PathBuf,

    /// Directory for benchmark logs
    pub logs_dir: PathBuf,
}

impl BenchConfig {
    pub fn new(data_dir: &Path, logs_dir: &Path) -> Self {
        let env_suffix = if cfg!(debug_assertions) {
            "dev"
        } else {
            "release"
        };

        Self {
            data_dir: data_dir.join(env_suffix),
            logs_dir: logs_dir.join(env_suffix),
        }
    }

    pub fn target(&self) -> TargetConfig {
        TargetConfig::new(&self.data_dir)
    }
}

/// Where a benchmark's dataset lives. Handed explicitly to every run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetConfig {
    pub data_dir: PathBuf,
}

impl TargetConfig {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// SQLite file backing the dataset with the given logical name.
    pub fn database_path(&self, logical_name: &str) -> PathBuf {
        self.data_dir.join(format!("{logical_name}.db"))
    }
}
