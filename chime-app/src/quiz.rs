//! Arithmetic quiz state machine
//!
//! Pure game logic: every player action returns a [`Transition`] carrying the
//! status line text and the sound that goes with it. Nothing here touches the
//! terminal or the audio engine.

use chime_audio::Effect;
use chime_input::{Direction, DIGIT_CHOICES};
use chime_tui::MessageType;

pub const LEVELS: u32 = 5;
pub const QUESTIONS_PER_LEVEL: u32 = 5;
/// Misses allowed in one level before the session ends
pub const MAX_MISSES: u32 = 3;
/// Seconds the correct/incorrect feedback stays up before play continues
pub const FEEDBACK_SECS: f64 = 0.9;

/// Largest result for a level: 0-20 at level 1 up to 0-100 at level 5
pub fn max_result(level: u32) -> u32 {
    (level.max(1) * 20).min(100)
}

/// Xorshift64 generator for operands and choice order
#[derive(Debug, Clone)]
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform value in `lo..=hi` (returns `lo` when the range is empty)
    pub fn range(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u64 + 1;
        lo + (self.next_u64() % span) as u32
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            items.swap(i, j);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub left: u32,
    pub right: u32,
    pub operation: Operation,
    pub choices: [u32; DIGIT_CHOICES],
    /// Index of the correct value in `choices`
    pub answer_index: usize,
}

impl Question {
    pub fn generate(level: u32, rng: &mut Rng) -> Self {
        let max = max_result(level);
        let operation = if rng.next_u64() % 2 == 0 {
            Operation::Add
        } else {
            Operation::Subtract
        };

        let (left, right) = match operation {
            Operation::Add => {
                let left = rng.range(1, max - 1);
                (left, rng.range(1, max - left))
            }
            Operation::Subtract => {
                let left = rng.range(2, max);
                (left, rng.range(1, left))
            }
        };

        let answer = match operation {
            Operation::Add => left + right,
            Operation::Subtract => left - right,
        };

        let mut choices = [answer; DIGIT_CHOICES];
        let distractors = distractors(answer, left, right, operation, rng);
        choices[1..].copy_from_slice(&distractors);
        rng.shuffle(&mut choices);
        let answer_index = choices.iter().position(|&c| c == answer).unwrap_or(0);

        Self {
            left,
            right,
            operation,
            choices,
            answer_index,
        }
    }

    pub fn answer(&self) -> u32 {
        self.choices[self.answer_index]
    }

    pub fn prompt(&self) -> String {
        format!("{} {} {} = ?", self.left, self.operation.symbol(), self.right)
    }

    /// The solved equation, for the status line
    pub fn solved(&self) -> String {
        format!(
            "{} {} {} = {}",
            self.left,
            self.operation.symbol(),
            self.right,
            self.answer()
        )
    }

    pub fn hint(&self) -> String {
        match self.operation {
            Operation::Add => format!("Start at {} and count up {}", self.left, self.right),
            Operation::Subtract => format!("Start at {} and count back {}", self.left, self.right),
        }
    }
}

/// Three distinct wrong answers near the right one
fn distractors(
    answer: u32,
    left: u32,
    right: u32,
    operation: Operation,
    rng: &mut Rng,
) -> [u32; DIGIT_CHOICES - 1] {
    // The classic mistake is using the other operation
    let swapped = match operation {
        Operation::Add => left.abs_diff(right),
        Operation::Subtract => left + right,
    };
    let offsets: [i64; 6] = [1, -1, 2, -2, 10, -10];

    let mut pool: Vec<u32> = offsets
        .iter()
        .filter_map(|&d| u32::try_from(answer as i64 + d).ok())
        .chain(std::iter::once(swapped))
        .collect();
    rng.shuffle(&mut pool);

    let mut picked = Vec::with_capacity(DIGIT_CHOICES - 1);
    let mut extra = 3;
    let mut candidates = pool.into_iter();
    while picked.len() < DIGIT_CHOICES - 1 {
        let candidate = candidates.next().unwrap_or_else(|| {
            extra += 1;
            answer + extra
        });
        if candidate != answer && !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }

    let mut out = [0; DIGIT_CHOICES - 1];
    out.copy_from_slice(&picked);
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Asking,
    /// Showing the result of the last answer; input is ignored
    Feedback { correct: bool, remaining: f64 },
    Victory,
    GameOver,
}

/// Result of a state change
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub message: String,
    pub kind: MessageType,
    /// Sound to play, if any
    pub effect: Option<Effect>,
}

impl Transition {
    fn new(message: impl Into<String>, kind: MessageType, effect: Effect) -> Self {
        Self {
            message: message.into(),
            kind,
            effect: Some(effect),
        }
    }

    fn silent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: MessageType::Info,
            effect: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Quiz {
    rng: Rng,
    question: Question,
    selected: usize,
    level: u32,
    /// Questions answered correctly in the current level
    solved: u32,
    misses: u32,
    score: u32,
    phase: Phase,
    hint: Option<String>,
}

impl Quiz {
    pub fn new(seed: u64) -> Self {
        let mut rng = Rng::new(seed);
        let question = Question::generate(1, &mut rng);
        Self {
            rng,
            question,
            selected: 0,
            level: 1,
            solved: 0,
            misses: 0,
            score: 0,
            phase: Phase::Asking,
            hint: None,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// 1-based position of the current question within its level
    pub fn question_number(&self) -> u32 {
        (self.solved + 1).min(QUESTIONS_PER_LEVEL)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn tries_left(&self) -> u32 {
        MAX_MISSES.saturating_sub(self.misses)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Victory | Phase::GameOver)
    }

    /// Move the choice cursor; clamps at both ends
    pub fn move_selection(&mut self, direction: Direction) -> Option<Transition> {
        if self.phase != Phase::Asking {
            return None;
        }
        let last = self.question.choices.len() - 1;
        self.selected = match direction {
            Direction::Left | Direction::Up => self.selected.saturating_sub(1),
            Direction::Right | Direction::Down => (self.selected + 1).min(last),
        };
        Some(Transition::new(
            format!(
                "Selected {} of {}: {}",
                self.selected + 1,
                last + 1,
                self.question.choices[self.selected]
            ),
            MessageType::Info,
            Effect::Click,
        ))
    }

    /// Submit the highlighted choice
    pub fn answer(&mut self) -> Option<Transition> {
        self.answer_choice(self.selected)
    }

    /// Submit a choice by index; out-of-range indices are ignored
    pub fn answer_choice(&mut self, index: usize) -> Option<Transition> {
        if self.phase != Phase::Asking || index >= self.question.choices.len() {
            return None;
        }
        self.selected = index;
        self.hint = None;

        if index == self.question.answer_index {
            self.score += 1;
            self.solved += 1;
            let solved = self.question.solved();

            if self.solved >= QUESTIONS_PER_LEVEL && self.level >= LEVELS {
                self.phase = Phase::Victory;
                return Some(Transition::new(
                    format!("{}. You finished all {} levels! Score {}", solved, LEVELS, self.score),
                    MessageType::Success,
                    Effect::Victory,
                ));
            }

            self.phase = Phase::Feedback {
                correct: true,
                remaining: FEEDBACK_SECS,
            };
            Some(Transition::new(
                format!("Correct! {}", solved),
                MessageType::Success,
                Effect::Correct,
            ))
        } else {
            self.misses += 1;
            let picked = self.question.choices[index];

            if self.misses >= MAX_MISSES {
                self.phase = Phase::GameOver;
                return Some(Transition::new(
                    format!(
                        "{} is not right. The answer was {}. Game over, score {}",
                        picked,
                        self.question.answer(),
                        self.score
                    ),
                    MessageType::Error,
                    Effect::GameOver,
                ));
            }

            self.phase = Phase::Feedback {
                correct: false,
                remaining: FEEDBACK_SECS,
            };
            let left = self.tries_left();
            Some(Transition::new(
                format!(
                    "{} is not right. Try again, {} {} left",
                    picked,
                    left,
                    if left == 1 { "try" } else { "tries" }
                ),
                MessageType::Warning,
                Effect::Incorrect,
            ))
        }
    }

    pub fn request_hint(&mut self) -> Option<Transition> {
        if self.phase != Phase::Asking {
            return None;
        }
        let hint = self.question.hint();
        self.hint = Some(hint.clone());
        Some(Transition::new(
            format!("Hint: {}", hint),
            MessageType::Info,
            Effect::Hint,
        ))
    }

    /// Start over at level 1 with a fresh question
    pub fn restart(&mut self) -> Transition {
        self.level = 1;
        self.solved = 0;
        self.misses = 0;
        self.score = 0;
        self.next_question();
        Transition::new(
            format!("New game. Level 1: {}", self.question.prompt()),
            MessageType::Info,
            Effect::Click,
        )
    }

    /// Advance the feedback timer by `dt` seconds
    pub fn tick(&mut self, dt: f64) -> Option<Transition> {
        let Phase::Feedback { correct, remaining } = self.phase else {
            return None;
        };
        let remaining = remaining - dt.max(0.0);
        if remaining > 0.0 {
            self.phase = Phase::Feedback { correct, remaining };
            return None;
        }

        if !correct {
            self.phase = Phase::Asking;
            return Some(Transition::silent(format!(
                "Try again: {}",
                self.question.prompt()
            )));
        }

        if self.solved >= QUESTIONS_PER_LEVEL {
            self.level += 1;
            self.solved = 0;
            self.misses = 0;
            self.next_question();
            return Some(Transition::new(
                format!("Level {}! {}", self.level, self.question.prompt()),
                MessageType::Success,
                Effect::Hint,
            ));
        }

        self.next_question();
        Some(Transition::silent(format!(
            "Question {}: {}",
            self.question_number(),
            self.question.prompt()
        )))
    }

    fn next_question(&mut self) {
        self.question = Question::generate(self.level, &mut self.rng);
        self.selected = 0;
        self.hint = None;
        self.phase = Phase::Asking;
    }
}
