//! Training statistics recording.
//!
//! One CSV row per finished episode, appended to `<stats_dir>/episodes.csv`.

pub mod csv_writer;
pub mod episode_stats;

pub use csv_writer::{load_stats, StatsWriter, STATS_FILE};
pub use episode_stats::EpisodeStats;
