use super::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiddleMetrics {
    pub words_guessed: u32,
    pub words_per_round: u32,
    pub total_incorrect: u32,
    pub max_incorrect_per_word: u32,
}

impl RiddleMetrics {
    pub fn words_guessed_pct(&self) -> f64 {
        super::ratio(self.words_guessed, self.words_per_round) * 100.0
    }

    pub fn miss_efficiency(&self) -> f64 {
        let budget = self.words_per_round * self.max_incorrect_per_word;
        super::ratio(self.total_incorrect, budget) * 100.0
    }
}

/// Stars from completion and miss efficiency; the score is the guessed-word count
pub fn riddle_rating(metrics: &RiddleMetrics) -> Rating {
    if metrics.words_per_round == 0 || metrics.max_incorrect_per_word == 0 {
        return Rating::new(metrics.words_guessed, 0);
    }

    let guessed = metrics.words_guessed_pct();
    let misses = metrics.miss_efficiency();

    let stars = if guessed >= 100.0 && misses <= 20.0 {
        3
    } else if guessed >= 80.0 && misses <= 50.0 {
        2
    } else if guessed >= 50.0 {
        1
    } else {
        0
    };

    Rating::new(metrics.words_guessed, stars)
}
