//! Training session: the loop that plays, learns and checkpoints.

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::TrainingConfig;
use crate::game::{Environment, Frame};
use crate::neural::NeuralManager;
use crate::recording::{load_stats, EpisodeStats, StatsWriter, STATS_FILE};
use crate::training::cancel::CancellationToken;
use crate::training::episode::EpisodeBuffer;
use crate::training::sampler::sample_action;
use crate::utils::image::{frame_difference, preprocess, INPUT_DIM};
use crate::Result;

/// Where the loop currently is within one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingObservation,
    Preprocessing,
    Inferring,
    Acting,
    Learning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EpisodeBudget,
    StepBudget,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub steps: usize,
    pub updates: usize,
    pub running_reward: Option<f64>,
    pub stop_reason: StopReason,
}

pub struct TrainingSession {
    config: TrainingConfig,
    cancel: CancellationToken,
    rng: StdRng,
    buffer: EpisodeBuffer,
    stats: StatsWriter,
    /// Preprocessed previous observation of the current episode
    previous: Option<Vec<f32>>,
    state: LoopState,
    /// Episodes recorded by earlier runs in the same stats file
    episode_offset: usize,
    episodes: usize,
    steps: usize,
    updates: usize,
    running_reward: Option<f64>,
}

impl TrainingSession {
    pub fn new(config: &TrainingConfig, cancel: CancellationToken) -> Result<Self> {
        let (episode_offset, running_reward) = if config.resume {
            resume_point(&config.stats_dir.join(STATS_FILE))?
        } else {
            (0, None)
        };
        let stats = StatsWriter::new(&config.stats_dir)?;
        log::info!("📊 Episode statistics -> {}", stats.path().display());
        if episode_offset > 0 {
            log::info!(
                "📂 Continuing statistics after episode {} (running reward {:?})",
                episode_offset,
                running_reward
            );
        }

        Ok(Self {
            config: config.clone(),
            cancel,
            rng: StdRng::seed_from_u64(config.seed),
            buffer: EpisodeBuffer::new(INPUT_DIM),
            stats,
            previous: None,
            state: LoopState::AwaitingObservation,
            episode_offset,
            episodes: 0,
            steps: 0,
            updates: 0,
            running_reward,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            Some(StopReason::Cancelled)
        } else if self.episodes >= self.config.max_episodes {
            Some(StopReason::EpisodeBudget)
        } else if self.config.max_steps.is_some_and(|max| self.steps >= max) {
            Some(StopReason::StepBudget)
        } else {
            None
        }
    }

    fn begin_episode<E: Environment>(&mut self, env: &mut E) -> Result<Frame> {
        self.previous = None;
        self.state = LoopState::AwaitingObservation;
        env.reset()
    }

    /// Run until a budget is exhausted or the token is cancelled.
    pub fn run<E: Environment>(
        &mut self,
        env: &mut E,
        manager: &mut NeuralManager,
    ) -> Result<TrainingSummary> {
        log::info!(
            "[Training] starting: max_episodes={}, max_steps={:?}, batch_episodes={}",
            self.config.max_episodes,
            self.config.max_steps,
            self.config.batch_episodes
        );

        let mut observation = self.begin_episode(env)?;
        let mut episode_steps = 0usize;
        let mut reward_sum = 0.0f64;

        let stop_reason = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }

            self.state = LoopState::Preprocessing;
            let current = preprocess(&observation);
            let input = frame_difference(&current, self.previous.as_deref())?;
            self.previous = Some(current);

            self.state = LoopState::Inferring;
            let prob_up = manager.probability_up(&input)?;
            let action = sample_action(&mut self.rng, prob_up);

            self.state = LoopState::Acting;
            let step = env.step(action)?;
            if self.config.render {
                env.render()?;
            }
            self.buffer.push_step(&input, action, prob_up, step.reward);
            self.steps += 1;
            episode_steps += 1;
            reward_sum += step.reward as f64;
            if step.reward != 0.0 {
                log::debug!(
                    "episode {}: point finished, reward {:+}",
                    self.episodes + 1,
                    step.reward
                );
            }
            observation = step.frame;

            if step.done {
                self.state = LoopState::Learning;
                self.finish_episode(manager, episode_steps, reward_sum)?;
                episode_steps = 0;
                reward_sum = 0.0;
                self.state = LoopState::AwaitingObservation;
                if let Some(reason) = self.stop_reason() {
                    break reason;
                }
                observation = self.begin_episode(env)?;
            } else {
                self.state = LoopState::AwaitingObservation;
            }
        };

        if self.updates > 0 {
            manager.save_checkpoint()?;
        }

        let summary = TrainingSummary {
            episodes: self.episodes,
            steps: self.steps,
            updates: self.updates,
            running_reward: self.running_reward,
            stop_reason,
        };
        log::info!("[Training] stopped ({:?}): {:?}", stop_reason, summary);
        Ok(summary)
    }

    fn finish_episode(
        &mut self,
        manager: &mut NeuralManager,
        episode_steps: usize,
        reward_sum: f64,
    ) -> Result<()> {
        self.buffer.finish_episode();
        self.episodes += 1;

        let batch = self.config.batch_episodes.max(1);
        let mut loss = None;
        if self.episodes % batch == 0 {
            if let Some(report) = manager.update(&self.buffer)? {
                self.updates += 1;
                loss = Some(report.loss);
            }
            self.buffer.clear();
        }

        let stats = EpisodeStats::new(
            self.episode_offset + self.episodes,
            episode_steps,
            reward_sum,
            self.running_reward,
            loss,
        );
        self.running_reward = Some(stats.running_reward);
        self.stats.write(&stats)?;

        log::info!(
            "Episode {} | steps: {}, reward: {:.1}, running reward: {:.3}{}",
            stats.episode,
            stats.steps,
            stats.reward_sum,
            stats.running_reward,
            loss.map(|l| format!(", loss: {:.4}", l)).unwrap_or_default()
        );

        let every = self.config.checkpoint_every;
        if every > 0 && self.episodes % every == 0 && self.updates > 0 {
            manager.save_checkpoint()?;
        }
        Ok(())
    }
}

/// Last episode number and running reward recorded in `path`, if any.
fn resume_point(path: &Path) -> Result<(usize, Option<f64>)> {
    if !path.exists() {
        return Ok((0, None));
    }
    Ok(load_stats(path)?
        .last()
        .map(|row| (row.episode, Some(row.running_reward)))
        .unwrap_or((0, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Action, PongSim, Step};
    use crate::recording::{load_stats, STATS_FILE};
    use std::collections::HashMap;
    use tempfile::{tempdir, TempDir};

    fn test_config(dir: &TempDir) -> TrainingConfig {
        TrainingConfig {
            hidden: 8,
            max_episodes: 2,
            checkpoint_every: 1,
            checkpoint_dir: dir.path().join("weights"),
            stats_dir: dir.path().join("stats"),
            ..Default::default()
        }
    }

    /// Environment that ends every episode after a fixed number of steps and
    /// records what the loop asked of it.
    struct ScriptedEnv {
        episode_len: usize,
        t: usize,
        resets: usize,
        actions: Vec<Action>,
        /// Cancel this token once the given number of steps has been taken
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl ScriptedEnv {
        fn new(episode_len: usize) -> Self {
            Self { episode_len, t: 0, resets: 0, actions: Vec::new(), cancel_after: None }
        }

        fn frame(&self) -> Frame {
            let mut frame = Frame::filled([144, 72, 17]);
            frame.set_pixel(41 + 2 * (self.t % 50), 80, [236, 236, 236]);
            frame
        }
    }

    impl Environment for ScriptedEnv {
        fn reset(&mut self) -> Result<Frame> {
            self.t = 0;
            self.resets += 1;
            Ok(self.frame())
        }

        fn step(&mut self, action: Action) -> Result<Step> {
            self.t += 1;
            self.actions.push(action);
            if let Some((after, token)) = &self.cancel_after {
                if self.actions.len() >= *after {
                    token.cancel();
                }
            }
            let done = self.t >= self.episode_len;
            Ok(Step {
                frame: self.frame(),
                reward: if done { 1.0 } else { 0.0 },
                done,
                info: HashMap::new(),
            })
        }
    }

    #[test]
    fn test_stops_on_episode_budget() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir);
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let mut session = TrainingSession::new(&config, CancellationToken::new()).unwrap();
        let mut env = ScriptedEnv::new(5);

        let summary = session.run(&mut env, &mut manager).unwrap();
        assert_eq!(summary.stop_reason, StopReason::EpisodeBudget);
        assert_eq!(summary.episodes, 2);
        assert_eq!(summary.steps, 10);
        assert_eq!(env.actions.len(), 10);
        // no reset once the last budgeted episode is over
        assert_eq!(env.resets, 2);
        assert!(config.checkpoint_path().exists());

        let rows = load_stats(config.stats_dir.join(STATS_FILE)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].steps, 5);
        assert_eq!(rows[1].reward_sum, 1.0);
    }

    #[test]
    fn test_stops_on_step_budget() {
        let dir = tempdir().unwrap();
        let config = TrainingConfig {
            max_steps: Some(7),
            max_episodes: 100,
            ..test_config(&dir)
        };
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let mut session = TrainingSession::new(&config, CancellationToken::new()).unwrap();

        let summary = session.run(&mut ScriptedEnv::new(3), &mut manager).unwrap();
        assert_eq!(summary.stop_reason, StopReason::StepBudget);
        assert_eq!(summary.steps, 7);
        assert_eq!(summary.episodes, 2);
    }

    #[test]
    fn test_cancelled_token_stops_before_first_step() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir);
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let mut session = TrainingSession::new(&config, token).unwrap();
        let mut env = ScriptedEnv::new(5);

        let summary = session.run(&mut env, &mut manager).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.steps, 0);
        assert!(env.actions.is_empty());
        assert!(!config.checkpoint_path().exists());
    }

    #[test]
    fn test_cancel_mid_episode_stops_at_next_step() {
        let dir = tempdir().unwrap();
        let config = TrainingConfig {
            max_episodes: 100,
            ..test_config(&dir)
        };
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let token = CancellationToken::new();
        let mut session = TrainingSession::new(&config, token.clone()).unwrap();
        let mut env = ScriptedEnv::new(5);
        env.cancel_after = Some((7, token));

        let summary = session.run(&mut env, &mut manager).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.steps, 7);
        assert_eq!(summary.episodes, 1);
        assert_eq!(env.actions.len(), 7);
    }

    #[test]
    fn test_session_without_update_keeps_checkpoint_config() {
        let dir = tempdir().unwrap();
        let config = TrainingConfig {
            max_episodes: 1,
            ..test_config(&dir)
        };
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let mut session = TrainingSession::new(&config, CancellationToken::new()).unwrap();
        session.run(&mut ScriptedEnv::new(3), &mut manager).unwrap();

        // a narrower run that stops before its first update
        let narrow = TrainingConfig {
            hidden: 4,
            max_episodes: 100,
            max_steps: Some(1),
            ..config.clone()
        };
        let mut manager = NeuralManager::with_config(&narrow).unwrap();
        let mut session = TrainingSession::new(&narrow, CancellationToken::new()).unwrap();
        let summary = session.run(&mut ScriptedEnv::new(3), &mut manager).unwrap();
        assert_eq!(summary.updates, 0);

        let saved = TrainingConfig::load(&config.checkpoint_dir).unwrap();
        assert_eq!(saved.hidden, config.hidden);
        let resumed = NeuralManager::with_config(&TrainingConfig {
            resume: true,
            ..saved
        });
        assert!(resumed.is_ok());
    }

    #[test]
    fn test_resume_continues_episode_numbering() {
        let dir = tempdir().unwrap();
        let config = test_config(&dir);
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let mut session = TrainingSession::new(&config, CancellationToken::new()).unwrap();
        session.run(&mut ScriptedEnv::new(3), &mut manager).unwrap();

        let resumed = TrainingConfig {
            resume: true,
            max_episodes: 1,
            ..config.clone()
        };
        let mut manager = NeuralManager::with_config(&resumed).unwrap();
        let mut session = TrainingSession::new(&resumed, CancellationToken::new()).unwrap();
        let summary = session.run(&mut ScriptedEnv::new(3), &mut manager).unwrap();
        assert_eq!(summary.episodes, 1);

        let rows = load_stats(config.stats_dir.join(STATS_FILE)).unwrap();
        assert_eq!(rows.iter().map(|r| r.episode).collect::<Vec<_>>(), vec![1, 2, 3]);
        let expected = crate::recording::episode_stats::running_reward(
            Some(rows[1].running_reward),
            rows[2].reward_sum,
        );
        assert!((rows[2].running_reward - expected).abs() < 1e-9);
    }

    #[test]
    fn test_batched_updates() {
        let dir = tempdir().unwrap();
        let config = TrainingConfig {
            max_episodes: 4,
            batch_episodes: 2,
            ..test_config(&dir)
        };
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let mut session = TrainingSession::new(&config, CancellationToken::new()).unwrap();

        let summary = session.run(&mut ScriptedEnv::new(4), &mut manager).unwrap();
        assert_eq!(summary.episodes, 4);
        assert_eq!(summary.updates, 2);

        let rows = load_stats(config.stats_dir.join(STATS_FILE)).unwrap();
        assert!(rows[0].loss.is_none());
        assert!(rows[1].loss.is_some());
    }

    #[test]
    fn test_runs_against_builtin_simulator() {
        let dir = tempdir().unwrap();
        let config = TrainingConfig {
            max_episodes: 1,
            ..test_config(&dir)
        };
        let mut manager = NeuralManager::with_config(&config).unwrap();
        let mut session = TrainingSession::new(&config, CancellationToken::new()).unwrap();
        let mut env = PongSim::with_rules(config.seed, 2, Some(400));

        let summary = session.run(&mut env, &mut manager).unwrap();
        assert_eq!(summary.episodes, 1);
        assert!(summary.steps > 0 && summary.steps <= 400);
        assert_eq!(session.state(), LoopState::AwaitingObservation);
    }
}
