//! Built-in Pong simulator.
//!
//! Paints frames with the colour palette of Atari 2600 Pong so the same
//! preprocessing applies to it and to the real emulator. The agent controls
//! the right (green) paddle; the left paddle follows the ball at a capped speed.

use std::collections::HashMap;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::game::frame::{FRAME_HEIGHT, FRAME_WIDTH};
use crate::game::{Action, Environment, Frame, Step};
use crate::utils::image::{preprocess, DOWNSAMPLED_SIDE};
use crate::Result;

pub const BACKGROUND: [u8; 3] = [144, 72, 17];
pub const SCORE_BAR: [u8; 3] = [109, 118, 43];
pub const WALL: [u8; 3] = [236, 236, 236];
pub const BALL: [u8; 3] = [236, 236, 236];
pub const AGENT_PADDLE: [u8; 3] = [92, 186, 92];
pub const OPPONENT_PADDLE: [u8; 3] = [213, 130, 74];

const SCORE_BAR_ROWS: usize = 24;
const COURT_TOP: f32 = 34.0;
const COURT_BOTTOM: f32 = 194.0;

const PADDLE_HEIGHT: f32 = 16.0;
const PADDLE_WIDTH: f32 = 4.0;
const AGENT_PADDLE_LEFT: f32 = 140.0;
const OPPONENT_PADDLE_LEFT: f32 = 16.0;
const AGENT_PADDLE_SPEED: f32 = 4.0;
const OPPONENT_PADDLE_SPEED: f32 = 2.5;

const BALL_WIDTH: f32 = 2.0;
const BALL_HEIGHT: f32 = 4.0;
const BALL_SPEED_X: f32 = 3.0;
const BALL_MAX_SPEED_Y: f32 = 3.0;
const BALL_JITTER: f32 = 0.6;

/// Points needed to end an episode in a full Atari game
pub const DEFAULT_POINTS_TO_WIN: u32 = 21;

#[derive(Debug, Clone, Copy)]
struct Ball {
    row: f32,
    col: f32,
    v_row: f32,
    v_col: f32,
}

pub struct PongSim {
    rng: StdRng,
    points_to_win: u32,
    max_episode_steps: Option<usize>,
    ball: Ball,
    agent_top: f32,
    opponent_top: f32,
    agent_score: u32,
    opponent_score: u32,
    steps: usize,
    last_frame: Option<Frame>,
}

impl PongSim {
    pub fn new(seed: u64) -> Self {
        Self::with_rules(seed, DEFAULT_POINTS_TO_WIN, None)
    }

    /// Simulator with custom episode length: the episode ends once either side
    /// reaches `points_to_win`, or after `max_episode_steps` steps if given.
    pub fn with_rules(seed: u64, points_to_win: u32, max_episode_steps: Option<usize>) -> Self {
        let mut sim = Self {
            rng: StdRng::seed_from_u64(seed),
            points_to_win: points_to_win.max(1),
            max_episode_steps,
            ball: Ball { row: 0.0, col: 0.0, v_row: 0.0, v_col: 0.0 },
            agent_top: 0.0,
            opponent_top: 0.0,
            agent_score: 0,
            opponent_score: 0,
            steps: 0,
            last_frame: None,
        };
        sim.reset_positions();
        sim
    }

    pub fn score(&self) -> (u32, u32) {
        (self.agent_score, self.opponent_score)
    }

    fn court_center() -> f32 {
        (COURT_TOP + COURT_BOTTOM - PADDLE_HEIGHT) / 2.0
    }

    fn reset_positions(&mut self) {
        self.agent_top = Self::court_center();
        self.opponent_top = Self::court_center();
        self.serve();
    }

    fn serve(&mut self) {
        let towards_agent = self.rng.random::<f64>() < 0.5;
        let v_row = (self.rng.random::<f64>() as f32 * 2.0 - 1.0) * BALL_MAX_SPEED_Y;
        self.ball = Ball {
            row: (COURT_TOP + COURT_BOTTOM) / 2.0,
            col: FRAME_WIDTH as f32 / 2.0,
            v_row,
            v_col: if towards_agent { BALL_SPEED_X } else { -BALL_SPEED_X },
        };
    }

    fn move_agent(&mut self, action: Action) {
        let delta = match action {
            Action::Up => -AGENT_PADDLE_SPEED,
            Action::Down => AGENT_PADDLE_SPEED,
        };
        self.agent_top = (self.agent_top + delta).clamp(COURT_TOP, COURT_BOTTOM - PADDLE_HEIGHT);
    }

    fn move_opponent(&mut self) {
        let target = self.ball.row + BALL_HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0;
        let delta = (target - self.opponent_top).clamp(-OPPONENT_PADDLE_SPEED, OPPONENT_PADDLE_SPEED);
        self.opponent_top = (self.opponent_top + delta).clamp(COURT_TOP, COURT_BOTTOM - PADDLE_HEIGHT);
    }

    fn overlaps_paddle(ball: &Ball, paddle_top: f32) -> bool {
        ball.row + BALL_HEIGHT >= paddle_top && ball.row <= paddle_top + PADDLE_HEIGHT
    }

    /// Bounce angle depends on where the ball meets the paddle, plus a little
    /// jitter so a dead-centre hit cannot start an endless flat rally.
    fn deflect(&mut self, ball: &mut Ball, paddle_top: f32) {
        let offset = (ball.row + BALL_HEIGHT / 2.0) - (paddle_top + PADDLE_HEIGHT / 2.0);
        let jitter = (self.rng.random::<f64>() as f32 - 0.5) * BALL_JITTER;
        ball.v_row = (offset / (PADDLE_HEIGHT / 2.0) * BALL_MAX_SPEED_Y + jitter)
            .clamp(-BALL_MAX_SPEED_Y, BALL_MAX_SPEED_Y);
        ball.v_col = -ball.v_col;
    }

    /// Advance the ball one tick and return the reward for the agent.
    fn advance_ball(&mut self) -> f32 {
        let mut ball = self.ball;
        ball.row += ball.v_row;
        ball.col += ball.v_col;

        if ball.row < COURT_TOP {
            ball.row = 2.0 * COURT_TOP - ball.row;
            ball.v_row = -ball.v_row;
        } else if ball.row + BALL_HEIGHT > COURT_BOTTOM {
            ball.row = 2.0 * (COURT_BOTTOM - BALL_HEIGHT) - ball.row;
            ball.v_row = -ball.v_row;
        }

        if ball.v_col > 0.0
            && ball.col + BALL_WIDTH >= AGENT_PADDLE_LEFT
            && ball.col <= AGENT_PADDLE_LEFT + PADDLE_WIDTH
            && Self::overlaps_paddle(&ball, self.agent_top)
        {
            ball.col = AGENT_PADDLE_LEFT - BALL_WIDTH;
            let paddle_top = self.agent_top;
            self.deflect(&mut ball, paddle_top);
        } else if ball.v_col < 0.0
            && ball.col <= OPPONENT_PADDLE_LEFT + PADDLE_WIDTH
            && ball.col + BALL_WIDTH >= OPPONENT_PADDLE_LEFT
            && Self::overlaps_paddle(&ball, self.opponent_top)
        {
            ball.col = OPPONENT_PADDLE_LEFT + PADDLE_WIDTH;
            let paddle_top = self.opponent_top;
            self.deflect(&mut ball, paddle_top);
        }
        self.ball = ball;

        if ball.col >= FRAME_WIDTH as f32 {
            self.opponent_score += 1;
            self.serve();
            -1.0
        } else if ball.col + BALL_WIDTH <= 0.0 {
            self.agent_score += 1;
            self.serve();
            1.0
        } else {
            0.0
        }
    }

    fn draw(&self) -> Frame {
        let mut frame = Frame::filled(BACKGROUND);
        frame.fill_rect(0, 0, SCORE_BAR_ROWS, FRAME_WIDTH, SCORE_BAR);
        frame.fill_rect(SCORE_BAR_ROWS, 0, COURT_TOP as usize - SCORE_BAR_ROWS, FRAME_WIDTH, WALL);
        frame.fill_rect(
            COURT_BOTTOM as usize,
            0,
            FRAME_HEIGHT - COURT_BOTTOM as usize,
            FRAME_WIDTH,
            WALL,
        );
        frame.fill_rect(
            self.opponent_top as usize,
            OPPONENT_PADDLE_LEFT as usize,
            PADDLE_HEIGHT as usize,
            PADDLE_WIDTH as usize,
            OPPONENT_PADDLE,
        );
        frame.fill_rect(
            self.agent_top as usize,
            AGENT_PADDLE_LEFT as usize,
            PADDLE_HEIGHT as usize,
            PADDLE_WIDTH as usize,
            AGENT_PADDLE,
        );
        if self.ball.col >= 0.0 {
            frame.fill_rect(
                self.ball.row as usize,
                self.ball.col as usize,
                BALL_HEIGHT as usize,
                BALL_WIDTH as usize,
                BALL,
            );
        }
        frame
    }

    fn info(&self) -> HashMap<String, String> {
        let mut info = HashMap::new();
        info.insert("score".to_string(), format!("{}:{}", self.agent_score, self.opponent_score));
        info.insert("episode_frame_number".to_string(), self.steps.to_string());
        info
    }
}

impl Environment for PongSim {
    fn reset(&mut self) -> Result<Frame> {
        self.agent_score = 0;
        self.opponent_score = 0;
        self.steps = 0;
        self.reset_positions();
        let frame = self.draw();
        self.last_frame = Some(frame.clone());
        Ok(frame)
    }

    fn step(&mut self, action: Action) -> Result<Step> {
        self.steps += 1;
        self.move_agent(action);
        self.move_opponent();
        let reward = self.advance_ball();

        let done = self.agent_score >= self.points_to_win
            || self.opponent_score >= self.points_to_win
            || self.max_episode_steps.is_some_and(|max| self.steps >= max);

        let frame = self.draw();
        self.last_frame = Some(frame.clone());
        Ok(Step {
            frame,
            reward,
            done,
            info: self.info(),
        })
    }

    fn render(&mut self) -> Result<()> {
        let Some(frame) = &self.last_frame else {
            return Ok(());
        };
        let pixels = preprocess(frame);
        let mut screen = String::with_capacity(pixels.len() + DOWNSAMPLED_SIDE + 16);
        let (agent, opponent) = self.score();
        screen.push_str(&format!("score {}:{}\n", agent, opponent));
        for row in pixels.chunks(DOWNSAMPLED_SIDE) {
            screen.extend(row.iter().map(|&v| if v > 0.0 { '#' } else { ' ' }));
            screen.push('\n');
        }
        print!("\x1B[2J\x1B[H{}", screen);
        Ok(())
    }
}
