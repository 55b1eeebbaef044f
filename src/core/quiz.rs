//! Quiz scoring: the full-workspace quiz and the per-section quiz shown
//! inline in the overview.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    pub section_id: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_answer
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

/// Per-question outcome after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub question_id: String,
    pub question: String,
    pub correct: bool,
    pub chosen: Option<String>,
    pub correct_option: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Unknown question {0}")]
    UnknownQuestion(String),

    #[error("Option {index} out of range for question {question_id}")]
    OptionOutOfRange { question_id: String, index: usize },

    #[error("Answer all {total} questions ({answered} answered)")]
    Incomplete { answered: usize, total: usize },

    #[error("Quiz already submitted")]
    AlreadySubmitted,
}

/// The whole-workspace quiz: answer everything, then submit once.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    answers: HashMap<String, usize>,
    submitted: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            answers: HashMap::new(),
            submitted: false,
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn answer(&self, question_id: &str) -> Option<usize> {
        self.answers.get(question_id).copied()
    }

    pub fn answered(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.contains_key(&q.id))
            .count()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Record (or replace) the chosen option. Locked after submission.
    pub fn select(&mut self, question_id: &str, option: usize) -> Result<(), QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| QuizError::UnknownQuestion(question_id.to_string()))?;
        if option >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                question_id: question_id.to_string(),
                index: option,
            });
        }
        self.answers.insert(question_id.to_string(), option);
        Ok(())
    }

    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.answered() == self.questions.len()
    }

    pub fn submit(&mut self) -> Result<(), QuizError> {
        if self.submitted {
            return Err(QuizError::AlreadySubmitted);
        }
        if !self.all_answered() {
            return Err(QuizError::Incomplete {
                answered: self.answered(),
                total: self.questions.len(),
            });
        }
        self.submitted = true;
        Ok(())
    }

    pub fn score(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answer(&q.id).is_some_and(|a| q.is_correct(a)))
            .count()
    }

    /// Rounded to the nearest whole percent; 0 for an empty quiz.
    pub fn percentage(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        ((self.score() as f64 / self.questions.len() as f64) * 100.0).round() as u32
    }

    /// `"{score} out of {total} ({pct}%)"`
    pub fn summary(&self) -> String {
        format!(
            "{} out of {} ({}%)",
            self.score(),
            self.questions.len(),
            self.percentage()
        )
    }

    pub fn results(&self) -> Vec<QuestionResult> {
        self.questions
            .iter()
            .map(|q| {
                let chosen = self.answer(&q.id);
                QuestionResult {
                    question_id: q.id.clone(),
                    question: q.question.clone(),
                    correct: chosen.is_some_and(|a| q.is_correct(a)),
                    chosen: chosen.and_then(|a| q.options.get(a).cloned()),
                    correct_option: q.correct_option().map(String::from),
                }
            })
            .collect()
    }

    /// Start over with the same questions.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.submitted = false;
    }
}

/// Step-through quiz for one section.
#[derive(Debug, Clone, Default)]
pub struct SectionQuiz {
    questions: Vec<QuizQuestion>,
    index: usize,
    selected: Option<usize>,
    checked: bool,
}

impl SectionQuiz {
    /// Questions for `section_id`, in source order.
    pub fn for_section(all: &[QuizQuestion], section_id: &str) -> Self {
        Self {
            questions: all
                .iter()
                .filter(|q| q.section_id == section_id)
                .cloned()
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// `None` once every question has been passed.
    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// 1-based position and total, e.g. `(2, 3)` for "Question 2 of 3".
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current().map(|_| (self.index + 1, self.questions.len()))
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Ignored once the current answer has been checked.
    pub fn select(&mut self, option: usize) -> bool {
        let Some(question) = self.current() else {
            return false;
        };
        if self.checked || option >= question.options.len() {
            return false;
        }
        self.selected = Some(option);
        true
    }

    pub fn can_check(&self) -> bool {
        self.selected.is_some() && !self.checked && !self.is_finished()
    }

    /// Reveal correctness of the selection. `None` if nothing can be checked.
    pub fn check(&mut self) -> Option<bool> {
        if !self.can_check() {
            return None;
        }
        self.checked = true;
        let question = self.current()?;
        self.selected.map(|s| question.is_correct(s))
    }

    /// Move on after a check.
    pub fn advance(&mut self) -> bool {
        if !self.checked {
            return false;
        }
        self.next_question();
        true
    }

    /// Move on without answering.
    pub fn skip(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.next_question();
        true
    }

    fn next_question(&mut self) {
        self.index += 1;
        self.selected = None;
        self.checked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn question(id: &str, section: &str, correct: usize) -> QuizQuestion {
        QuizQuestion {
            id: id.into(),
            question: format!("Question {id}?"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
            section_id: section.into(),
        }
    }

    fn five() -> Vec<QuizQuestion> {
        vec![
            question("1", "1", 2),
            question("2", "2", 1),
            question("3", "3", 1),
            question("4", "2", 2),
            question("5", "3", 1),
        ]
    }

    #[test]
    fn test_deserialize_camel_case() {
        let q: QuizQuestion = serde_json::from_str(
            r#"{"id":"1","question":"Q?","options":["x","y"],"correctAnswer":1,"sectionId":"s1"}"#,
        )
        .unwrap();
        assert_eq!(q.correct_answer, 1);
        assert_eq!(q.section_id, "s1");
        assert_eq!(q.correct_option(), Some("y"));
    }

    #[rstest]
    #[case::all_correct(vec![2, 1, 1, 2, 1], 5, 100)]
    #[case::none_correct(vec![0, 0, 0, 0, 0], 0, 0)]
    #[case::three_of_five(vec![2, 1, 1, 0, 0], 3, 60)]
    fn test_score(#[case] choices: Vec<usize>, #[case] score: usize, #[case] pct: u32) {
        let mut session = QuizSession::new(five());
        for (i, choice) in choices.into_iter().enumerate() {
            session.select(&(i + 1).to_string(), choice).unwrap();
        }
        session.submit().unwrap();
        assert_eq!(session.score(), score);
        assert_eq!(session.percentage(), pct);
    }

    #[test]
    fn test_submit_requires_all_answered() {
        let mut session = QuizSession::new(five());
        session.select("1", 2).unwrap();
        assert_eq!(
            session.submit(),
            Err(QuizError::Incomplete {
                answered: 1,
                total: 5
            })
        );
        assert!(!session.is_submitted());
    }

    #[test]
    fn test_reselect_replaces_answer() {
        let mut session = QuizSession::new(five());
        session.select("1", 0).unwrap();
        session.select("1", 2).unwrap();
        assert_eq!(session.answer("1"), Some(2));
        assert_eq!(session.answered(), 1);
    }

    #[test]
    fn test_select_rejects_unknown_and_out_of_range() {
        let mut session = QuizSession::new(five());
        assert!(matches!(session.select("9", 0), Err(QuizError::UnknownQuestion(_))));
        assert!(matches!(
            session.select("1", 4),
            Err(QuizError::OptionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_results_and_summary() {
        let mut session = QuizSession::new(vec![question("1", "1", 2), question("2", "1", 0)]);
        session.select("1", 2).unwrap();
        session.select("2", 3).unwrap();
        session.submit().unwrap();

        let results = session.results();
        assert!(results[0].correct);
        assert!(!results[1].correct);
        assert_eq!(results[1].chosen.as_deref(), Some("d"));
        assert_eq!(results[1].correct_option.as_deref(), Some("a"));
        assert_eq!(session.summary(), "1 out of 2 (50%)");

        assert_eq!(session.select("1", 0), Err(QuizError::AlreadySubmitted));
        session.reset();
        assert_eq!(session.answered(), 0);
    }

    #[test]
    fn test_empty_quiz_cannot_submit() {
        let mut session = QuizSession::new(Vec::new());
        assert!(!session.all_answered());
        assert!(session.submit().is_err());
        assert_eq!(session.percentage(), 0);
    }

    #[test]
    fn test_section_quiz_filters_by_section() {
        let quiz = SectionQuiz::for_section(&five(), "2");
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.current().map(|q| q.id.as_str()), Some("2"));
        assert_eq!(quiz.position(), Some((1, 2)));
        assert!(SectionQuiz::for_section(&five(), "7").is_empty());
    }

    #[test]
    fn test_section_quiz_check_then_advance() {
        let mut quiz = SectionQuiz::for_section(&five(), "2");
        assert_eq!(quiz.check(), None);
        assert!(!quiz.advance());

        assert!(quiz.select(1));
        assert_eq!(quiz.check(), Some(true));
        // locked after check
        assert!(!quiz.select(0));
        assert_eq!(quiz.check(), None);

        assert!(quiz.advance());
        assert_eq!(quiz.position(), Some((2, 2)));
        assert_eq!(quiz.selected(), None);

        quiz.select(0);
        assert_eq!(quiz.check(), Some(false));
        quiz.advance();
        assert!(quiz.is_finished());
        assert_eq!(quiz.position(), None);
    }

    #[test]
    fn test_section_quiz_skip() {
        let mut quiz = SectionQuiz::for_section(&five(), "3");
        assert!(quiz.skip());
        assert!(quiz.skip());
        assert!(quiz.is_finished());
        assert!(!quiz.skip());
        assert!(!quiz.select(0));
    }
}
