use classroom_games::level::{
    LevelDefinition, LevelParams, MemoryParams, PuzzleParams, RiddleParams, RiddleWord,
};

use super::setup::GRADE;

pub fn puzzle_level(rows: u32, cols: u32, time_limit: u32) -> LevelDefinition {
    LevelDefinition {
        id: "puzzle-level".to_string(),
        name: format!("{}x{} puzzle", rows, cols),
        grade: GRADE.to_string(),
        active: true,
        params: LevelParams::Puzzle(PuzzleParams {
            rows,
            cols,
            time_limit,
            image: "lighthouse.png".to_string(),
        }),
    }
}

pub fn memory_level(pair_count: u32, time_limit: u32, attempt_limit: u32) -> LevelDefinition {
    LevelDefinition {
        id: "memory-level".to_string(),
        name: format!("{} pairs", pair_count),
        grade: GRADE.to_string(),
        active: true,
        params: LevelParams::Memory(MemoryParams {
            pair_count,
            time_limit,
            attempt_limit,
            images: (0..pair_count).map(|n| format!("animal-{}.png", n)).collect(),
        }),
    }
}

pub fn riddle_level(
    words: &[&str],
    words_per_round: u32,
    max_incorrect_per_word: u32,
    round_time_limit: u32,
) -> LevelDefinition {
    LevelDefinition {
        id: "riddle-level".to_string(),
        name: "Word riddle".to_string(),
        grade: GRADE.to_string(),
        active: true,
        params: LevelParams::Riddle(RiddleParams {
            words: words
                .iter()
                .map(|word| RiddleWord::with_hint(*word, format!("{} letters", word.len())))
                .collect(),
            words_per_round,
            max_incorrect_per_word,
            round_time_limit,
        }),
    }
}
