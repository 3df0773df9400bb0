mod utils;

use std::collections::BTreeSet;
use std::time::Duration;

use classroom_games::{
    game::{GameEngine, GameError, RiddleAction, RiddleEngine, RiddlePhase},
    report::GameMetrics,
    scoring::Rating,
    GameKind, Notice,
};
use utils::{advance, advance_seconds, riddle_level, TestSetupBuilder, STUDENT};

const FEEDBACK: Duration = Duration::from_millis(1500);

fn guess(letter: char) -> RiddleAction {
    RiddleAction::Guess(letter)
}

async fn solve_current(engine: &mut RiddleEngine) {
    let letters: BTreeSet<char> = engine
        .current_word()
        .expect("a word should be in play")
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    for letter in letters {
        engine.apply(guess(letter)).await.unwrap();
    }
}

#[tokio::test]
async fn perfect_round_earns_three_stars() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["cat", "dog", "sun", "owl", "bee"], 5, 5, 0))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());
    engine.start(None).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::Playing);
    assert_eq!(snapshot.to_result(STUDENT), None);
    assert_eq!(snapshot.display, "___");
    assert_eq!(snapshot.hint.as_deref(), Some("3 letters"));
    assert_eq!(snapshot.words_played, 1);

    for word in 1..=5 {
        solve_current(&mut engine).await;
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.phase, RiddlePhase::WordWon);
        assert_eq!(snapshot.words_guessed, word);
        assert_eq!(engine.apply(guess('q')).await, Err(GameError::FeedbackPending));

        advance(&mut engine, &setup.scheduler, FEEDBACK).await;
    }

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert!(snapshot.is_terminal());
    assert_eq!(snapshot.total_incorrect, 0);
    assert_eq!(snapshot.rating, Some(Rating { score: 5, stars: 3 }));
    assert_eq!(snapshot.next_level.as_deref(), Some("level-2"));

    let progress = setup.tracker.load(STUDENT, GameKind::Riddle).await.unwrap().unwrap();
    assert_eq!(progress.completed_levels, vec!["level-1".to_string()]);

    tokio::task::yield_now().await;
    assert_eq!(setup.sink.result_count().await, 0, "riddle results are not reported");

    let result = snapshot.to_result(STUDENT).expect("finished round has a result");
    assert_eq!(result.game_kind, GameKind::Riddle);
    assert_eq!(result.level_id, "level-1");
    assert!(result.completed);
    assert_eq!((result.score, result.stars), (5, 3));
    assert_eq!(
        result.metrics,
        GameMetrics::Riddle {
            words_guessed: 5,
            total_incorrect: 0
        }
    );
}

#[tokio::test]
async fn lost_word_counts_the_full_miss_budget() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["cat", "dog"], 1, 3, 0))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());
    engine.start(None).await.unwrap();
    assert_eq!(engine.current_word(), Some("cat"));

    engine.apply(guess('x')).await.unwrap();
    engine.apply(guess('y')).await.unwrap();
    assert_eq!(engine.snapshot().incorrect_guesses, 2);
    assert_eq!(engine.snapshot().revealed_word, None);
    engine.apply(guess('z')).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::WordLost);
    assert_eq!(snapshot.total_incorrect, 3);
    assert_eq!(snapshot.revealed_word.as_deref(), Some("cat"));

    advance(&mut engine, &setup.scheduler, FEEDBACK).await;
    assert_eq!(engine.phase(), RiddlePhase::Playing);
    assert_eq!(engine.current_word(), Some("dog"));
    assert_eq!(engine.snapshot().words_played, 2);

    solve_current(&mut engine).await;
    advance(&mut engine, &setup.scheduler, FEEDBACK).await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert_eq!(snapshot.words_guessed, 1);
    assert_eq!(snapshot.total_incorrect, 3);
    assert_eq!(snapshot.rating, Some(Rating { score: 1, stars: 1 }));
}

#[tokio::test]
async fn running_out_of_words_ends_the_round() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["ox", "ant"], 2, 1, 0))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());
    engine.start(None).await.unwrap();

    engine.apply(guess('z')).await.unwrap();
    advance(&mut engine, &setup.scheduler, FEEDBACK).await;
    engine.apply(guess('z')).await.unwrap();
    assert_eq!(engine.phase(), RiddlePhase::WordLost);
    advance(&mut engine, &setup.scheduler, FEEDBACK).await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert_eq!(snapshot.words_guessed, 0);
    assert_eq!(snapshot.total_incorrect, 2);
    assert_eq!(snapshot.rating, Some(Rating::ZERO));
    assert_eq!(snapshot.next_level, None);
    assert!(!snapshot.to_result(STUDENT).unwrap().completed);

    let progress = setup.tracker.load(STUDENT, GameKind::Riddle).await.unwrap().unwrap();
    assert!(progress.completed_levels.is_empty());
}

#[tokio::test]
async fn letters_are_case_insensitive_and_non_letters_shown() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["Ice-cream"], 1, 5, 0))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());
    engine.start(None).await.unwrap();
    assert_eq!(engine.snapshot().display, "___-_____");

    engine.apply(guess('I')).await.unwrap();
    assert_eq!(engine.snapshot().display, "I__-_____");

    engine.apply(guess('C')).await.unwrap();
    assert_eq!(engine.snapshot().display, "Ic_-c____");

    assert_eq!(engine.apply(guess('3')).await, Err(GameError::InvalidGuess('3')));
    assert_eq!(engine.apply(guess('-')).await, Err(GameError::InvalidGuess('-')));

    let before = engine.snapshot();
    engine.apply(guess('i')).await.unwrap();
    assert_eq!(engine.snapshot(), before);
    assert_eq!(before.guessed_letters, vec!['c', 'i']);
    assert_eq!(before.incorrect_guesses, 0);
}

#[tokio::test]
async fn round_timeout_loses_the_current_word() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["cat", "dog"], 2, 4, 10))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());
    engine.start(None).await.unwrap();
    assert_eq!(engine.snapshot().remaining_seconds, Some(10));

    engine.apply(guess('x')).await.unwrap();
    advance_seconds(&mut engine, &setup.scheduler, 10).await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert_eq!(snapshot.remaining_seconds, Some(0));
    assert_eq!(snapshot.total_incorrect, 4);
    assert_eq!(snapshot.revealed_word.as_deref(), Some("cat"));
    assert_eq!(snapshot.rating, Some(Rating::ZERO));
    assert_eq!(setup.scheduler.pending(), 0);
}

#[tokio::test]
async fn too_few_words_completes_immediately() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["cat", "dog"], 5, 5, 60))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());

    engine.start(None).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert_eq!(snapshot.rating, Some(Rating::ZERO));
    assert!(matches!(
        snapshot.notices.as_slice(),
        [Notice::InvalidLevelContent(_)]
    ));
    assert_eq!(setup.scheduler.pending(), 0);
    assert_eq!(
        engine.apply(guess('a')).await,
        Err(GameError::NotPlaying("level_complete".to_string()))
    );
}

#[tokio::test]
async fn missing_level_completes_immediately() {
    let setup = TestSetupBuilder::new().build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());

    engine.start(None).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert_eq!(snapshot.next_level, None);
    assert_eq!(
        snapshot.notices,
        vec![Notice::ConfigurationMissing(GameKind::Riddle)]
    );
}

#[tokio::test]
async fn teardown_during_feedback_stays_put() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["cat", "dog"], 2, 5, 30))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());
    engine.start(None).await.unwrap();

    solve_current(&mut engine).await;
    assert_eq!(engine.phase(), RiddlePhase::WordWon);
    engine.teardown();
    assert_eq!(setup.scheduler.pending(), 0);

    let before = engine.snapshot();
    advance_seconds(&mut engine, &setup.scheduler, 3).await;
    assert_eq!(engine.snapshot(), before);
}

#[tokio::test]
async fn words_follow_the_shuffled_order() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["cat", "dog", "sun"], 1, 5, 0))
        .with_shuffle(vec![2, 0, 1])
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());

    engine.start(None).await.unwrap();

    assert_eq!(engine.current_word(), Some("sun"));
}

#[tokio::test]
async fn words_without_letters_are_skipped() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["123", "cat", "", "dog"], 2, 5, 0))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());
    engine.start(None).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::Playing);
    assert!(matches!(
        snapshot.notices.as_slice(),
        [Notice::InvalidLevelContent(_)]
    ));
    assert_eq!(engine.current_word(), Some("cat"));

    solve_current(&mut engine).await;
    advance(&mut engine, &setup.scheduler, FEEDBACK).await;
    assert_eq!(engine.current_word(), Some("dog"));
    solve_current(&mut engine).await;
    advance(&mut engine, &setup.scheduler, FEEDBACK).await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert_eq!(snapshot.total_incorrect, 0);
    assert_eq!(snapshot.rating, Some(Rating { score: 2, stars: 3 }));
}

#[tokio::test]
async fn only_letterless_words_complete_immediately() {
    let setup = TestSetupBuilder::new()
        .with_level(riddle_level(&["42", "--"], 1, 5, 0))
        .build();
    let mut engine = RiddleEngine::new(setup.ctx.clone());

    engine.start(None).await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, RiddlePhase::LevelComplete);
    assert_eq!(snapshot.notices.len(), 2);
    assert_eq!(snapshot.rating, Some(Rating::ZERO));
}
