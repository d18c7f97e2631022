//! Five-question body scan.
//!
//! Needs (water, food) are uncomfortable when answered "no". Irritants
//! (noise, light, temperature) are uncomfortable when answered "yes".

use crate::types::SensoryScanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Need,
    Irritant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub text: &'static str,
    pub kind: QuestionKind,
}

pub const QUESTIONS: [Question; 5] = [
    Question {
        text: "Have you had some water recently?",
        kind: QuestionKind::Need,
    },
    Question {
        text: "Have you eaten something?",
        kind: QuestionKind::Need,
    },
    Question {
        text: "Is there too much noise around you?",
        kind: QuestionKind::Irritant,
    },
    Question {
        text: "Is the light too strong?",
        kind: QuestionKind::Irritant,
    },
    Question {
        text: "Are you too hot or too cold?",
        kind: QuestionKind::Irritant,
    },
];

/// Whether a yes/no answer flags discomfort for this kind of question.
fn uncomfortable(kind: QuestionKind, yes: bool) -> bool {
    match kind {
        QuestionKind::Need => !yes,
        QuestionKind::Irritant => yes,
    }
}

/// Scan in progress.
#[derive(Debug, Clone, Default)]
pub struct SensoryScan {
    flags: Vec<bool>,
}

pub enum ScanStep {
    /// Next question index.
    Ask(usize),
    Done([bool; 5]),
}

impl SensoryScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        QUESTIONS.get(self.flags.len())
    }

    /// Answer the current question.
    pub fn answer(&mut self, yes: bool) -> ScanStep {
        if let Some(question) = self.current_question() {
            self.flags.push(uncomfortable(question.kind, yes));
        }
        match <[bool; 5]>::try_from(self.flags.as_slice()) {
            Ok(flags) => ScanStep::Done(flags),
            Err(_) => ScanStep::Ask(self.flags.len()),
        }
    }
}

/// Assemble the stored result from the five discomfort flags, in question order.
pub fn into_result(id: String, timestamp: i64, flags: [bool; 5]) -> SensoryScanResult {
    let [thirst, hunger, noise, light, temperature] = flags;
    SensoryScanResult {
        id,
        timestamp,
        thirst,
        hunger,
        noise,
        light,
        temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(answers: [bool; 5]) -> [bool; 5] {
        let mut scan = SensoryScan::new();
        for (i, yes) in answers.iter().enumerate() {
            match scan.answer(*yes) {
                ScanStep::Ask(next) => assert_eq!(next, i + 1),
                ScanStep::Done(flags) => {
                    assert_eq!(i, 4);
                    return flags;
                }
            }
        }
        panic!("scan never finished");
    }

    #[test]
    fn test_all_yes_flags_only_irritants() {
        assert_eq!(run([true; 5]), [false, false, true, true, true]);
    }

    #[test]
    fn test_all_no_flags_only_needs() {
        assert_eq!(run([false; 5]), [true, true, false, false, false]);
    }

    #[test]
    fn test_result_fields_follow_question_order() {
        let result = into_result("s1".to_string(), 42, run([false, true, false, true, false]));
        assert!(result.thirst);
        assert!(!result.hunger);
        assert!(!result.noise);
        assert!(result.light);
        assert!(!result.temperature);
    }

    #[test]
    fn test_first_question_is_water() {
        let scan = SensoryScan::new();
        assert_eq!(scan.current_question(), Some(&QUESTIONS[0]));
    }
}
