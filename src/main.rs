use std::path::PathBuf;

use clap::Parser;

use pong_pg::config::TrainingConfig;
use pong_pg::game::pong_sim::{PongSim, DEFAULT_POINTS_TO_WIN};
use pong_pg::logging::setup_logging;
use pong_pg::neural::NeuralManager;
use pong_pg::training::{CancellationToken, TrainingSession};

#[derive(Parser, Debug)]
#[command(name = "pong_pg", about = "Train a Pong policy network with REINFORCE")]
struct Config {
    /// Number of episodes to play before stopping
    #[arg(short = 'e', long, default_value_t = 1000)]
    episodes: usize,

    /// Stop after this many environment steps in total
    #[arg(long)]
    max_steps: Option<usize>,

    /// Hidden layer width
    #[arg(long, default_value_t = 200)]
    hidden: i64,

    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Reward discount factor
    #[arg(long, default_value_t = 0.99)]
    gamma: f32,

    /// Episodes per parameter update
    #[arg(long, default_value_t = 1)]
    batch_episodes: usize,

    /// Elementwise gradient clamp
    #[arg(long, default_value_t = 1.0)]
    grad_clip: f64,

    /// Save weights every N episodes (0 = only at the end)
    #[arg(long, default_value_t = 10)]
    checkpoint_every: usize,

    #[arg(long, default_value = "model_weights")]
    checkpoint_dir: PathBuf,

    #[arg(long, default_value = "training_stats")]
    stats_dir: PathBuf,

    /// Write logs to rotated files in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Points that end an episode in the built-in simulator
    #[arg(long, default_value_t = DEFAULT_POINTS_TO_WIN)]
    points_to_win: u32,

    /// Render frames to the terminal (also enabled by the RENDER env var)
    #[arg(long, default_value_t = false)]
    render: bool,

    /// Load the last checkpoint before training (also enabled by the RESUME env var)
    #[arg(long, default_value_t = false)]
    resume: bool,

    /// Use CUDA when available
    #[arg(long, default_value_t = false)]
    cuda: bool,
}

impl From<&Config> for TrainingConfig {
    fn from(cli: &Config) -> Self {
        TrainingConfig {
            hidden: cli.hidden,
            learning_rate: cli.learning_rate,
            gamma: cli.gamma,
            batch_episodes: cli.batch_episodes,
            grad_clip: cli.grad_clip,
            checkpoint_every: cli.checkpoint_every,
            max_episodes: cli.episodes,
            max_steps: cli.max_steps,
            seed: cli.seed,
            render: cli.render,
            resume: cli.resume,
            checkpoint_dir: cli.checkpoint_dir.clone(),
            stats_dir: cli.stats_dir.clone(),
            use_cuda: cli.cuda,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Config::parse();
    let _logger = setup_logging(cli.log_dir.as_deref())?;

    let config = TrainingConfig::from(&cli).with_env_overrides();
    log::info!("🏓 pong_pg {} | {:?}", pong_pg::VERSION, config);

    let mut manager = NeuralManager::with_config(&config)?;
    let mut env = PongSim::with_rules(config.seed, cli.points_to_win, None);
    let mut session = TrainingSession::new(&config, CancellationToken::new())?;

    let summary = session.run(&mut env, &mut manager)?;
    log::info!(
        "Done: {} episodes, {} steps, {} updates, running reward {:?}",
        summary.episodes,
        summary.steps,
        summary.updates,
        summary.running_reward
    );
    Ok(())
}
