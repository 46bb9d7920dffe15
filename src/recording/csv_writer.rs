//! CSV writer for episode statistics.
//!
//! Format: episode,steps,reward_sum,running_reward,loss,timestamp

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::recording::episode_stats::EpisodeStats;
use crate::Result;

pub const STATS_FILE: &str = "episodes.csv";

/// Appends one row per episode; the header is written only for a new file.
pub struct StatsWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl StatsWriter {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;

        let path = base_dir.join(STATS_FILE);
        let is_new = !path.exists() || fs::metadata(&path)?.len() == 0;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&mut self, stats: &EpisodeStats) -> Result<()> {
        self.writer.serialize(stats)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Read back every row of a stats file
pub fn load_stats<P: AsRef<Path>>(path: P) -> Result<Vec<EpisodeStats>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}
