use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::{commit, get_bgzf_writer, get_output, partial_path};
use crate::matrix::VariantMatrix;
use crate::pipeline::PipelineConfig;

/// Pipeline positions at which the matrix can be persisted, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointName {
    Filtered,
    QcStats,
    SecondFilter,
}

impl CheckpointName {
    pub const ALL: [Self; 3] = [Self::Filtered, Self::QcStats, Self::SecondFilter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filtered => "filtered",
            Self::QcStats => "qc_stats",
            Self::SecondFilter => "second_filter",
        }
    }
}

impl std::fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted matrix together with the configuration and input that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: CheckpointName,
    pub config: PipelineConfig,
    /// [`VariantMatrix::fingerprint`] of the input matrix
    #[serde(default)]
    pub input: String,
    pub matrix: VariantMatrix,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    name: CheckpointName,
    config: &'a PipelineConfig,
    input: &'a str,
    matrix: &'a VariantMatrix,
}

/// Durable named snapshots. Writing a name again replaces the earlier snapshot.
pub trait CheckpointStore: Send + Sync {
    /// Persist `matrix` under `name`, recording the fingerprint of the input it
    /// was derived from. The write is complete when this returns.
    fn write(
        &self,
        name: CheckpointName,
        config: &PipelineConfig,
        input: &str,
        matrix: &VariantMatrix,
    ) -> Result<PathBuf>;

    fn read(&self, name: CheckpointName) -> Result<Option<Snapshot>>;
}

/// Stores each checkpoint as `{dir}/{name}.json.gz`, bgzip compressed json
#[derive(Debug, Clone)]
pub struct DirCheckpointStore {
    dir: PathBuf,
}

impl DirCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: CheckpointName) -> PathBuf {
        self.dir.join(format!("{name}.json.gz"))
    }
}

impl CheckpointStore for DirCheckpointStore {
    fn write(
        &self,
        name: CheckpointName,
        config: &PipelineConfig,
        input: &str,
        matrix: &VariantMatrix,
    ) -> Result<PathBuf> {
        let now = std::time::Instant::now();
        let path = self.path(name);
        let partial = partial_path(&path);

        let snapshot = SnapshotRef {
            name,
            config,
            input,
            matrix,
        };
        if let Err(e) = write_snapshot(&partial, &snapshot) {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
        commit(&partial, &path)?;

        tracing::info!("Wrote checkpoint {name} to {path:?} in {:?}", now.elapsed());
        Ok(path)
    }

    fn read(&self, name: CheckpointName) -> Result<Option<Snapshot>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }

        let snapshot = read_snapshot(&path)?;
        tracing::debug!("Read checkpoint {name} from {path:?}");
        Ok(Some(snapshot))
    }
}

fn write_snapshot(path: &Path, snapshot: &SnapshotRef) -> Result<()> {
    let mut output = get_output(path)?;
    let mut writer = get_bgzf_writer(&mut output);

    serde_json::to_writer(&mut writer, snapshot).map_err(|source| {
        if source.is_io() {
            Error::io(path, source.into())
        } else {
            Error::Checkpoint {
                name: snapshot.name.to_string(),
                source,
            }
        }
    })?;

    writer.close().map_err(|e| Error::io(path, e))?;
    output.sync_all().map_err(|e| Error::io(path, e))
}

/// Read a single checkpoint file
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = bgzip::BGZFReader::new(file).map_err(|e| Error::Compression {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_reader(reader).map_err(|source| Error::Checkpoint {
        name: path.display().to_string(),
        source,
    })
}
