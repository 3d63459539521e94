//! Prompt construction for a single question.

use crate::engine::MatchMode;
use crate::model::{QuestionType, TriviaRecord};

const RETRY_NOTE: &str = "You did not answer correctly: either the structure is wrong or the answer is not one of the ones provided. Please try again.";

/// One attempt at getting a valid answer for a question.
///
/// Lives only for the duration of one record's evaluation.
#[derive(Debug, Clone)]
pub struct PromptAttempt<'a> {
    pub question: &'a str,
    pub kind: QuestionType,
    pub possible_answers: Vec<String>,
    /// Number of attempts already rejected before this one.
    pub retry_count: u32,
}

impl<'a> PromptAttempt<'a> {
    /// First attempt for a record.
    pub fn for_record(record: &'a TriviaRecord) -> Self {
        Self {
            question: &record.question,
            kind: record.kind,
            possible_answers: record.possible_answers(),
            retry_count: 0,
        }
    }

    /// The follow-up attempt after a rejected answer.
    pub fn retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    /// Whether `answer` belongs to the possible-answer set.
    pub fn accepts(&self, answer: &str, mode: MatchMode) -> bool {
        self.possible_answers
            .iter()
            .any(|candidate| mode.matches(candidate, answer))
    }

    /// Render the prompt text sent to the model.
    pub fn render(&self) -> String {
        let mut prompt = match self.kind {
            QuestionType::Multiple => {
                let choices = self
                    .possible_answers
                    .iter()
                    .map(|answer| format!("- {answer}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "You are given the following multiple type question: {question}\n\n\
                     The possible answers are:\n\n\
                     {choices}\n\n\
                     Answer this question with one of the possible answers above, using the structure {{\"answer\": answer}}.\n\
                     You are forbidden to answer anything other than one of the possible answers provided.",
                    question = self.question,
                )
            }
            QuestionType::Boolean => format!(
                "You are given the following boolean type question: {question}\n\n\
                 Answer either True or False, using the structure {{\"answer\": \"True\" | \"False\"}}.\n\
                 You are forbidden to answer anything other than \"True\" or \"False\".",
                question = self.question,
            ),
        };

        if self.retry_count > 0 {
            prompt.push('\n');
            prompt.push_str(RETRY_NOTE);
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple() -> TriviaRecord {
        TriviaRecord {
            category: "Geography".into(),
            kind: QuestionType::Multiple,
            difficulty: "easy".into(),
            question: "What is the capital of France?".into(),
            correct_answer: "Paris".into(),
            incorrect_answers: vec!["Lyon".into(), "Marseille".into(), "Nice".into()],
        }
    }

    #[test]
    fn multiple_choice_prompt_lists_answers_in_order() {
        let record = multiple();
        let prompt = PromptAttempt::for_record(&record).render();
        assert!(prompt.contains("What is the capital of France?"));
        let paris = prompt.find("- Paris").unwrap();
        let lyon = prompt.find("- Lyon").unwrap();
        let nice = prompt.find("- Nice").unwrap();
        assert!(paris < lyon && lyon < nice);
        assert!(prompt.contains(r#"{"answer": answer}"#));
        assert!(!prompt.contains(RETRY_NOTE));
    }

    #[test]
    fn boolean_prompt_offers_only_true_false() {
        let record = TriviaRecord {
            kind: QuestionType::Boolean,
            question: "The sky is blue.".into(),
            correct_answer: "True".into(),
            incorrect_answers: vec!["Blue".into(), "Green".into()],
            ..multiple()
        };
        let attempt = PromptAttempt::for_record(&record);
        assert_eq!(attempt.possible_answers, vec!["True", "False"]);

        let prompt = attempt.render();
        assert!(prompt.contains("boolean type question"));
        assert!(!prompt.contains("Blue"));
        assert!(!prompt.contains("Green"));
    }

    #[test]
    fn retry_appends_note() {
        let record = multiple();
        let first = PromptAttempt::for_record(&record);
        let second = first.retry();
        assert_eq!(second.retry_count, 1);
        assert!(second.render().ends_with(RETRY_NOTE));
        assert_eq!(second.retry().retry_count, 2);
    }

    #[test]
    fn membership_follows_match_mode() {
        let record = multiple();
        let attempt = PromptAttempt::for_record(&record);
        assert!(attempt.accepts("Paris", MatchMode::Exact));
        assert!(!attempt.accepts("paris", MatchMode::Exact));
        assert!(attempt.accepts("paris", MatchMode::CaseInsensitive));
        assert!(!attempt.accepts("Berlin", MatchMode::CaseInsensitive));
    }
}
