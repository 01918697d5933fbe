use serde::{Deserialize, Serialize};

/// Self-assessed 1-10 traits. Discipline drives the target scheduler's
/// pacing; the rest are carried for the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UserTraits {
    pub concentration: i64,
    pub discipline: i64,
    pub motivation: i64,
    pub energy: i64,
}

impl Default for UserTraits {
    fn default() -> Self {
        Self {
            concentration: 5,
            discipline: 5,
            motivation: 5,
            energy: 5,
        }
    }
}

impl UserTraits {
    pub fn clamped(self) -> Self {
        Self {
            concentration: self.concentration.clamp(1, 10),
            discipline: self.discipline.clamp(1, 10),
            motivation: self.motivation.clamp(1, 10),
            energy: self.energy.clamp(1, 10),
        }
    }
}
