//! Pose/relax cycle producing the game-state label

use std::time::{Duration, Instant};

use crate::source::GameStateSource;

/// Label reported between poses
pub const RELAX_LABEL: &str = "Relax";

/// The twelve positions of a Surya Namaskar round
pub const SURYA_NAMASKAR: [&str; 12] = [
    "Pranamasana",
    "Hasta Uttanasana",
    "Padahastasana",
    "Ashwa Sanchalanasana",
    "Dandasana",
    "Ashtanga Namaskara",
    "Bhujangasana",
    "Adho Mukha Svanasana",
    "Ashwa Sanchalanasana",
    "Padahastasana",
    "Hasta Uttanasana",
    "Pranamasana",
];

/// Alternates each pose with a relax phase, wrapping around the pose list
///
/// The label is a pure function of elapsed time: pose 0 for `pose_duration`,
/// relax for `relax_duration`, pose 1, relax, and so on.
#[derive(Debug, Clone)]
pub struct GameStateSequencer {
    poses: Vec<String>,
    pose_duration: Duration,
    relax_duration: Duration,
    started: Instant,
}

impl Default for GameStateSequencer {
    fn default() -> Self {
        Self::new(SURYA_NAMASKAR, Duration::from_secs(5), Duration::from_secs(2))
    }
}

impl GameStateSequencer {
    pub fn new<I, S>(poses: I, pose_duration: Duration, relax_duration: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            poses: poses.into_iter().map(Into::into).collect(),
            pose_duration,
            relax_duration,
            started: Instant::now(),
        }
    }

    pub fn poses(&self) -> &[String] {
        &self.poses
    }

    /// Label after `elapsed` time in the sequence
    pub fn label_at(&self, elapsed: Duration) -> &str {
        let round = self.pose_duration + self.relax_duration;
        if self.poses.is_empty() || round.is_zero() {
            return RELAX_LABEL;
        }

        let round_nanos = round.as_nanos();
        let completed = elapsed.as_nanos() / round_nanos;
        let into_round = elapsed.as_nanos() % round_nanos;

        if into_round < self.pose_duration.as_nanos() {
            let index = (completed % self.poses.len() as u128) as usize;
            &self.poses[index]
        } else {
            RELAX_LABEL
        }
    }

    /// Label right now
    pub fn current(&self) -> &str {
        self.label_at(self.started.elapsed())
    }
}

impl GameStateSource for GameStateSequencer {
    fn current_label(&self) -> Option<String> {
        Some(self.current().to_string())
    }
}
