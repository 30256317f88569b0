//! Quiz session state machine.
//!
//! A session moves `Idle -> Presenting -> AwaitingNext -> ... -> Finished`.
//! [`Quiz`] owns the catalog, both stores and the random source, and holds at
//! most one [`QuizSession`] at a time.

use crate::catalog::Catalog;
use crate::history::HistoryStore;
use crate::memory::MemoryStore;
use crate::models::{RankFilter, SessionResult, VocabularyEntry, WrongAnswer};
use crate::random::{shuffle, RandomSource};
use thiserror::Error;

/// Maximum questions per session.
pub const SESSION_LENGTH: usize = 10;

/// Wrong options drawn per question.
pub const DISTRACTORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("Vocabulary not loaded")]
    CatalogUnavailable,
    #[error("No words found for {}", .0.label())]
    NoWordsAvailable(RankFilter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session.
    Idle,
    /// A question is shown and waits for an answer.
    Presenting,
    /// The answer was given; waiting for the user to move on.
    AwaitingNext,
    /// Result recorded; review list still readable.
    Finished,
}

/// The word being asked and its answer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub entry: VocabularyEntry,
    pub options: Vec<VocabularyEntry>,
}

impl Question {
    /// Index of the correct option.
    pub fn answer_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o.same_word(&self.entry))
    }
}

/// What happened when an answer was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// Word the user picked.
    pub chosen: String,
    /// The question's entry.
    pub answer: VocabularyEntry,
    /// New memory level, when the session tracks memory.
    pub level: Option<u8>,
}

/// Result of moving past an answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A new question is presented.
    Question,
    /// The queue ran out and the session was recorded.
    Finished(SessionResult),
}

/// Transient state of one run.
#[derive(Debug, Clone)]
pub struct QuizSession {
    rank_filter: RankFilter,
    score: u32,
    questions_answered: usize,
    total_questions: usize,
    /// Consumed from the back.
    queue: Vec<VocabularyEntry>,
    current: Option<Question>,
    wrong_answers: Vec<WrongAnswer>,
    phase: Phase,
    last_answer: Option<AnswerOutcome>,
    result: Option<SessionResult>,
}

impl QuizSession {
    fn new(rank_filter: RankFilter, queue: Vec<VocabularyEntry>) -> Self {
        Self {
            rank_filter,
            score: 0,
            questions_answered: 0,
            total_questions: queue.len(),
            queue,
            current: None,
            wrong_answers: Vec::new(),
            phase: Phase::Idle,
            last_answer: None,
            result: None,
        }
    }

    pub fn rank_filter(&self) -> RankFilter {
        self.rank_filter
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Questions presented so far, including the current one.
    pub fn questions_answered(&self) -> usize {
        self.questions_answered
    }

    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn wrong_answers(&self) -> &[WrongAnswer] {
        &self.wrong_answers
    }

    pub fn last_answer(&self) -> Option<&AnswerOutcome> {
        self.last_answer.as_ref()
    }

    /// Recorded result once finished.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// True when the current question is the last one.
    pub fn is_last_question(&self) -> bool {
        self.queue.is_empty()
    }

    /// Share of the session presented so far, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.questions_answered as f64 / self.total_questions as f64
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Presenting | Phase::AwaitingNext)
    }
}

/// Controller tying a session to the catalog and the stores.
pub struct Quiz {
    catalog: Catalog,
    memory: MemoryStore,
    history: HistoryStore,
    rng: Box<dyn RandomSource>,
    session: Option<QuizSession>,
}

impl Quiz {
    pub fn new(
        catalog: Catalog,
        memory: MemoryStore,
        history: HistoryStore,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            catalog,
            memory,
            history,
            rng,
            session: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().and_then(|s| s.current.as_ref())
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_active())
    }

    /// Begin a session over the words matching `filter`.
    ///
    /// Any previous session is discarded. On error no session exists.
    pub fn start(&mut self, filter: RankFilter) -> Result<(), QuizError> {
        self.session = None;

        if self.catalog.is_empty() {
            tracing::warn!("start requested without a catalog");
            return Err(QuizError::CatalogUnavailable);
        }

        let mut queue: Vec<VocabularyEntry> = self.catalog.filter(filter).into_iter().cloned().collect();
        if queue.is_empty() {
            tracing::info!(rank = %filter, "no words for rank");
            return Err(QuizError::NoWordsAvailable(filter));
        }

        shuffle(&mut queue, self.rng.as_mut());
        queue.truncate(SESSION_LENGTH);

        tracing::info!(rank = %filter, questions = queue.len(), "session started");
        self.session = Some(QuizSession::new(filter, queue));
        self.present_next();
        Ok(())
    }

    /// Submit the entry the user picked. Ignored unless a question is waiting for an answer.
    pub fn submit_answer(&mut self, choice: &VocabularyEntry) -> Option<AnswerOutcome> {
        let session = self.session.as_mut()?;
        if session.phase != Phase::Presenting {
            tracing::debug!("answer ignored, question already answered");
            return None;
        }
        let answer = session.current.as_ref()?.entry.clone();
        let correct = choice.same_word(&answer);

        let level = if session.rank_filter.is_all() {
            None
        } else {
            match self.memory.adjust(&answer.word, correct) {
                Ok(level) => Some(level),
                Err(err) => {
                    tracing::warn!(word = %answer.word, error = %err, "failed to persist memory level");
                    Some(self.memory.get(&answer.word))
                }
            }
        };

        if correct {
            session.score += 1;
        } else {
            session.wrong_answers.push(WrongAnswer::from(&answer));
        }
        session.phase = Phase::AwaitingNext;

        tracing::debug!(word = %answer.word, chosen = %choice.word, correct, "answer submitted");
        let outcome = AnswerOutcome {
            correct,
            chosen: choice.word.clone(),
            answer,
            level,
        };
        session.last_answer = Some(outcome.clone());
        Some(outcome)
    }

    /// Submit the option at `index` of the current question.
    pub fn submit_option(&mut self, index: usize) -> Option<AnswerOutcome> {
        let choice = self.current_question()?.options.get(index)?.clone();
        self.submit_answer(&choice)
    }

    /// Move past an answered question. Ignored unless an answer was given.
    pub fn advance(&mut self) -> Option<Step> {
        let session = self.session.as_ref()?;
        if session.phase != Phase::AwaitingNext {
            return None;
        }
        if session.queue.is_empty() {
            return self.finish().map(Step::Finished);
        }
        self.present_next();
        Some(Step::Question)
    }

    /// Record the session's result and keep the review list readable.
    pub fn finish(&mut self) -> Option<SessionResult> {
        let session = self.session.as_mut()?;
        if !session.is_active() {
            return None;
        }

        let result = SessionResult::new(
            session.rank_filter,
            session.score,
            session.total_questions as u32,
        );
        session.phase = Phase::Finished;
        session.current = None;
        session.result = Some(result.clone());

        if let Err(err) = self.history.append(result.clone()) {
            tracing::warn!(error = %err, "failed to persist session result");
        }
        tracing::info!(rank = %result.rank, score = result.score, total = result.total, "session finished");
        Some(result)
    }

    /// Drop the current session without recording anything.
    pub fn quit(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                tracing::info!(
                    rank = %session.rank_filter,
                    answered = session.questions_answered,
                    "session abandoned"
                );
                true
            }
            None => false,
        }
    }

    fn present_next(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        let Some(entry) = session.queue.pop() else { return };

        let options = generate_options(&entry, &self.catalog, session.rank_filter, self.rng.as_mut());
        session.questions_answered += 1;
        session.current = Some(Question { entry, options });
        session.last_answer = None;
        session.phase = Phase::Presenting;
    }
}

/// Build the answer options for `correct`: up to three distractors plus the answer, shuffled.
///
/// When a ranked pool holds fewer than three other words the whole catalog is used,
/// so distractors may come from other ranks.
pub fn generate_options(
    correct: &VocabularyEntry,
    catalog: &Catalog,
    filter: RankFilter,
    rng: &mut dyn RandomSource,
) -> Vec<VocabularyEntry> {
    let mut pool: Vec<&VocabularyEntry> = catalog
        .filter(filter)
        .into_iter()
        .filter(|e| !e.same_word(correct))
        .collect();

    if pool.len() < DISTRACTORS && !filter.is_all() {
        pool = catalog.entries().iter().filter(|e| !e.same_word(correct)).collect();
    }

    let mut options = Vec::with_capacity(DISTRACTORS + 1);
    while options.len() < DISTRACTORS && !pool.is_empty() {
        let idx = rng.next_index(pool.len());
        options.push(pool.remove(idx).clone());
    }
    options.push(correct.clone());
    shuffle(&mut options, rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SystemRandom};
    use crate::storage::{KeyValueStore, MemoryKv, SharedStore, MEMORY_KEY};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn pets() -> Catalog {
        Catalog::new(vec![
            VocabularyEntry::new("dog", "a domestic animal", 1),
            VocabularyEntry::new("cat", "a small pet", 1),
            VocabularyEntry::new("sun", "a star", 2),
            VocabularyEntry::new("moon", "a satellite", 2),
        ])
    }

    fn numbered(size: usize) -> Catalog {
        Catalog::new(
            (0..size)
                .map(|i| VocabularyEntry::new(format!("word{}", i), format!("meaning {}", i), (i % 4) as u8 + 1))
                .collect(),
        )
    }

    fn quiz_over(catalog: Catalog, store: SharedStore, rng: Box<dyn RandomSource>) -> Quiz {
        let memory = MemoryStore::load(store.clone());
        let history = HistoryStore::load(store);
        Quiz::new(catalog, memory, history, rng)
    }

    fn quiz(catalog: Catalog) -> Quiz {
        quiz_over(catalog, Rc::new(MemoryKv::new()), Box::new(SystemRandom::seeded(42)))
    }

    fn wrong_option(quiz: &Quiz) -> VocabularyEntry {
        let question = quiz.current_question().unwrap();
        question
            .options
            .iter()
            .find(|o| !o.same_word(&question.entry))
            .cloned()
            .unwrap()
    }

    fn right_option(quiz: &Quiz) -> VocabularyEntry {
        quiz.current_question().unwrap().entry.clone()
    }

    #[test]
    fn test_start_ranked_session() {
        let mut quiz = quiz(pets());
        quiz.start(RankFilter::Rank(1)).unwrap();

        let session = quiz.session().unwrap();
        assert_eq!(session.total_questions(), 2);
        assert_eq!(session.questions_answered(), 1);
        assert_eq!(session.remaining(), 1);
        assert_eq!(quiz.phase(), Phase::Presenting);
        assert_eq!(quiz.current_question().unwrap().entry.rank, 1);
    }

    #[test]
    fn test_start_without_words() {
        let mut quiz = quiz(pets());
        assert_eq!(
            quiz.start(RankFilter::Rank(4)),
            Err(QuizError::NoWordsAvailable(RankFilter::Rank(4)))
        );
        assert_eq!(quiz.phase(), Phase::Idle);
        assert!(quiz.session().is_none());
    }

    #[test]
    fn test_start_with_empty_catalog() {
        let mut quiz = quiz(Catalog::default());
        assert_eq!(quiz.start(RankFilter::All), Err(QuizError::CatalogUnavailable));
        assert_eq!(quiz.phase(), Phase::Idle);
    }

    #[test]
    fn test_session_capped_at_ten() {
        let mut quiz = quiz(numbered(30));
        quiz.start(RankFilter::All).unwrap();
        assert_eq!(quiz.session().unwrap().total_questions(), SESSION_LENGTH);
    }

    #[test]
    fn test_dog_then_cat_scenario() {
        // Shuffle swaps [dog, cat] into [cat, dog]; the tail pops dog first.
        let mut quiz = quiz_over(pets(), Rc::new(MemoryKv::new()), Box::new(ScriptedRandom::new(vec![0])));
        quiz.start(RankFilter::Rank(1)).unwrap();

        assert_eq!(quiz.current_question().unwrap().entry.word, "dog");
        let outcome = quiz.submit_answer(&right_option(&quiz)).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.level, Some(1));
        assert_eq!(quiz.advance(), Some(Step::Question));

        assert_eq!(quiz.current_question().unwrap().entry.word, "cat");
        let outcome = quiz.submit_answer(&wrong_option(&quiz)).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.level, Some(0));

        let Some(Step::Finished(result)) = quiz.advance() else {
            panic!("session should finish");
        };
        assert_eq!(result.score, 1);
        assert_eq!(result.total, 2);

        let session = quiz.session().unwrap();
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(
            session.wrong_answers(),
            &[WrongAnswer {
                word: "cat".to_string(),
                meaning: "a small pet".to_string()
            }]
        );
        assert_eq!(quiz.history().all()[0], result);
        assert_eq!(quiz.memory().get("dog"), 1);
        assert_eq!(quiz.memory().get("cat"), 0);
    }

    #[test]
    fn test_duplicate_submission_ignored() {
        let mut quiz = quiz(pets());
        quiz.start(RankFilter::Rank(1)).unwrap();
        let right = right_option(&quiz);

        assert!(quiz.submit_answer(&right).is_some());
        assert!(quiz.submit_answer(&right).is_none());
        assert_eq!(quiz.session().unwrap().score(), 1);
        assert_eq!(quiz.memory().get(&right.word), 1);
    }

    #[test]
    fn test_advance_requires_answer() {
        let mut quiz = quiz(pets());
        assert_eq!(quiz.advance(), None);
        quiz.start(RankFilter::Rank(1)).unwrap();
        assert_eq!(quiz.advance(), None);
        assert_eq!(quiz.session().unwrap().questions_answered(), 1);
    }

    #[test]
    fn test_correctness_by_word_only() {
        let mut quiz = quiz(pets());
        quiz.start(RankFilter::Rank(1)).unwrap();
        let mut impostor = right_option(&quiz);
        impostor.meaning = impostor.meaning.to_uppercase();
        impostor.rank = 4;
        assert!(quiz.submit_answer(&impostor).unwrap().correct);
    }

    #[test]
    fn test_mastery_across_sessions() {
        let catalog = Catalog::new(vec![
            VocabularyEntry::new("dog", "a domestic animal", 1),
            VocabularyEntry::new("sun", "a star", 2),
            VocabularyEntry::new("moon", "a satellite", 2),
        ]);
        let store: SharedStore = Rc::new(MemoryKv::new());
        let mut quiz = quiz_over(catalog.clone(), store.clone(), Box::new(SystemRandom::seeded(3)));

        let mut levels = Vec::new();
        for _ in 0..4 {
            quiz.start(RankFilter::Rank(1)).unwrap();
            let outcome = quiz.submit_answer(&right_option(&quiz)).unwrap();
            levels.push(outcome.level.unwrap());
            assert!(matches!(quiz.advance(), Some(Step::Finished(_))));
        }
        assert_eq!(levels, vec![1, 2, 3, 3]);
        assert_eq!(quiz.history().all().len(), 4);

        let reloaded = quiz_over(catalog, store, Box::new(SystemRandom::seeded(3)));
        assert_eq!(reloaded.memory().get("dog"), 3);
    }

    #[test]
    fn test_all_filter_leaves_memory_alone() {
        let store: SharedStore = Rc::new(MemoryKv::new());
        let mut quiz = quiz_over(pets(), store.clone(), Box::new(SystemRandom::seeded(9)));
        quiz.start(RankFilter::All).unwrap();

        let mut correct = true;
        while quiz.is_active() {
            let choice = if correct { right_option(&quiz) } else { wrong_option(&quiz) };
            assert_eq!(quiz.submit_answer(&choice).unwrap().level, None);
            correct = !correct;
            quiz.advance();
        }

        assert_eq!(quiz.memory().len(), 0);
        assert_eq!(store.get(MEMORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_quit_records_nothing() {
        let mut quiz = quiz(pets());
        quiz.start(RankFilter::Rank(2)).unwrap();
        quiz.submit_answer(&right_option(&quiz));
        assert!(quiz.quit());
        assert_eq!(quiz.phase(), Phase::Idle);
        assert!(quiz.history().is_empty());
        assert!(!quiz.quit());
    }

    #[test]
    fn test_finish_early_records_partial_score() {
        let mut quiz = quiz(numbered(12));
        quiz.start(RankFilter::All).unwrap();
        quiz.submit_answer(&right_option(&quiz));
        let result = quiz.finish().unwrap();
        assert_eq!((result.score, result.total), (1, 10));
        assert_eq!(quiz.finish(), None);
    }

    #[test]
    fn test_restart_after_finish() {
        let mut quiz = quiz(pets());
        quiz.start(RankFilter::Rank(2)).unwrap();
        quiz.finish();
        quiz.start(RankFilter::Rank(2)).unwrap();
        let session = quiz.session().unwrap();
        assert_eq!(session.score(), 0);
        assert!(session.wrong_answers().is_empty());
        assert_eq!(session.phase(), Phase::Presenting);
    }

    #[test]
    fn test_options_widen_to_full_catalog() {
        let catalog = pets();
        let dog = catalog.entries()[0].clone();
        let options = generate_options(&dog, &catalog, RankFilter::Rank(1), &mut ScriptedRandom::identity());
        assert_eq!(options.len(), 4);
        let words: HashSet<_> = options.iter().map(|o| o.word.as_str()).collect();
        assert_eq!(words, HashSet::from(["dog", "cat", "sun", "moon"]));
    }

    #[test]
    fn test_options_deterministic_draws() {
        let catalog = numbered(8);
        let correct = catalog.entries()[0].clone();
        // Draws take pool[0] each time, then the identity shuffle keeps the order.
        let mut rng = ScriptedRandom::new(vec![0, 0, 0, usize::MAX, usize::MAX, usize::MAX]);
        let options = generate_options(&correct, &catalog, RankFilter::All, &mut rng);
        let words: Vec<_> = options.iter().map(|o| o.word.as_str()).collect();
        assert_eq!(words, vec!["word1", "word2", "word3", "word0"]);
    }

    #[test]
    fn test_options_small_catalog() {
        let catalog = Catalog::new(vec![
            VocabularyEntry::new("dog", "a domestic animal", 1),
            VocabularyEntry::new("cat", "a small pet", 1),
        ]);
        let dog = catalog.entries()[0].clone();
        let options = generate_options(&dog, &catalog, RankFilter::All, &mut SystemRandom::seeded(1));
        assert_eq!(options.len(), 2);

        let single = Catalog::new(vec![dog.clone()]);
        let options = generate_options(&dog, &single, RankFilter::Rank(1), &mut SystemRandom::seeded(1));
        assert_eq!(options, vec![dog]);
    }

    #[test]
    fn test_submit_option_by_index() {
        let mut quiz = quiz(pets());
        quiz.start(RankFilter::Rank(2)).unwrap();
        let index = quiz.current_question().unwrap().answer_index().unwrap();
        assert!(quiz.submit_option(99).is_none());
        assert!(quiz.submit_option(index).unwrap().correct);
    }

    proptest! {
        #[test]
        fn prop_session_invariants(
            seed in any::<u64>(),
            size in 1usize..25,
            ranked in any::<bool>(),
            picks in proptest::collection::vec(0usize..4, SESSION_LENGTH),
        ) {
            let catalog = numbered(size);
            let filter = if ranked { RankFilter::Rank(1) } else { RankFilter::All };
            let expected = catalog.filter(filter).len().min(SESSION_LENGTH);

            let mut quiz = quiz_over(catalog, Rc::new(MemoryKv::new()), Box::new(SystemRandom::seeded(seed)));
            quiz.start(filter).unwrap();

            let mut asked = 0;
            let mut correct_count: u32 = 0;
            let mut seen = HashSet::new();
            while quiz.is_active() {
                let session = quiz.session().unwrap();
                prop_assert_eq!(session.remaining() + session.questions_answered(), expected);

                let question = quiz.current_question().unwrap().clone();
                prop_assert!(filter.matches(&question.entry));
                prop_assert!(seen.insert(question.entry.word.clone()));

                let matching = question.options.iter().filter(|o| o.same_word(&question.entry)).count();
                prop_assert_eq!(matching, 1);
                let words: HashSet<_> = question.options.iter().map(|o| o.word.as_str()).collect();
                prop_assert_eq!(words.len(), question.options.len());

                let choice = question.options[picks[asked] % question.options.len()].clone();
                if choice.same_word(&question.entry) {
                    correct_count += 1;
                }
                quiz.submit_answer(&choice);
                let level = quiz.memory().get(&question.entry.word);
                prop_assert!(level <= 3);
                asked += 1;
                quiz.advance();
            }

            prop_assert_eq!(asked, expected);
            let result = quiz.session().unwrap().result().unwrap().clone();
            prop_assert_eq!(result.score, correct_count);
            prop_assert_eq!(result.total as usize, expected);
            if !ranked {
                prop_assert_eq!(quiz.memory().len(), 0);
            }
        }
    }
}
