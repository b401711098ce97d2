use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Two-stop gradients a subject card can be painted with, as ARGB.
pub const SUBJECT_CARD_COLORS: [[u32; 2]; 4] = [
    [0xFF_67C6E3, 0xFF_378CE7],
    [0xFF_FFD770, 0xFF_FFA726],
    [0xFF_F09EB8, 0xFF_E65C8A],
    [0xFF_A1E887, 0xFF_58B368],
];

/// A subject the user studies, with a goal in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Option<i64>,
    pub name: String,
    pub goal_hours: f32,
    pub colors: Vec<u32>,
}

impl Subject {
    pub fn new(name: impl Into<String>, goal_hours: f32, colors: Vec<u32>) -> Self {
        Self {
            id: None,
            name: name.into(),
            goal_hours,
            colors,
        }
    }

    /// Pick one of the card palettes at random.
    pub fn random_colors() -> Vec<u32> {
        SUBJECT_CARD_COLORS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(SUBJECT_CARD_COLORS[0])
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_colors_is_a_known_palette() {
        for _ in 0..16 {
            let colors = Subject::random_colors();
            assert!(SUBJECT_CARD_COLORS.iter().any(|p| p.as_slice() == colors));
        }
    }

    #[test]
    fn new_subject_has_no_id() {
        let subject = Subject::new("Physics", 10.0, Subject::random_colors());
        assert!(subject.id.is_none());
        assert_eq!(subject.name, "Physics");
    }
}
