// src/proctor/scoring.rs

use serde::Serialize;

use crate::{config::POINTS_PER_CORRECT, models::question::Question};

/// Outcome of grading one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub correct: u32,
    pub wrong: u32,
    /// Empty answers, counted as neither correct nor wrong.
    pub unanswered: u32,
    pub total: u32,
    /// Rounded percentage, 0-100.
    pub score: u32,
    pub points: u32,
}

/// Grades canonical-order answers by exact string equality.
///
/// `answers[i]` belongs to `questions[i]`; missing trailing answers count as
/// unanswered.
pub fn calculate_score(questions: &[Question], answers: &[String]) -> ScoreSummary {
    let total = questions.len() as u32;
    let mut correct = 0;
    let mut wrong = 0;

    for (idx, question) in questions.iter().enumerate() {
        match answers.get(idx).map(String::as_str) {
            None | Some("") => {}
            Some(answer) if answer == question.correct_answer => correct += 1,
            Some(_) => wrong += 1,
        }
    }

    let score = if total == 0 {
        0
    } else {
        (correct as f64 / total as f64 * 100.0).round() as u32
    };

    ScoreSummary {
        correct,
        wrong,
        unanswered: total - correct - wrong,
        total,
        score,
        points: correct * POINTS_PER_CORRECT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn questions(keys: &[&str]) -> Vec<Question> {
        keys.iter()
            .enumerate()
            .map(|(i, key)| Question {
                id: i as i64 + 1,
                question_text: format!("Question {}", i),
                question_type: QuestionType::Mcq,
                options: vec!["A", "B", "C", "D", "E", "X"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                correct_answer: key.to_string(),
                image_url: None,
                option_images: None,
            })
            .collect()
    }

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_calculate_score_mixed() {
        let summary = calculate_score(
            &questions(&["A", "B", "C", "D", "E"]),
            &answers(&["A", "B", "X", "D", ""]),
        );
        assert_eq!(summary.correct, 3);
        assert_eq!(summary.wrong, 1);
        assert_eq!(summary.unanswered, 1);
        assert_eq!(summary.score, 60);
        assert_eq!(summary.points, 6);
    }

    #[test]
    fn test_calculate_score_perfect() {
        let summary = calculate_score(&questions(&["A", "B"]), &answers(&["A", "B"]));
        assert_eq!(summary.score, 100);
        assert_eq!(summary.points, 4);
    }

    #[test]
    fn test_calculate_score_rounds() {
        // 2/3 = 66.67%
        let summary = calculate_score(&questions(&["A", "B", "C"]), &answers(&["A", "B", "A"]));
        assert_eq!(summary.score, 67);
    }

    #[test]
    fn test_calculate_score_short_answer_list() {
        let summary = calculate_score(&questions(&["A", "B", "C"]), &answers(&["A"]));
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.unanswered, 2);
        assert_eq!(summary.score, 33);
    }

    #[test]
    fn test_calculate_score_is_case_sensitive() {
        let summary = calculate_score(&questions(&["True"]), &answers(&["true"]));
        assert_eq!(summary.correct, 0);
        assert_eq!(summary.wrong, 1);
    }

    #[test]
    fn test_calculate_score_empty_quiz() {
        let summary = calculate_score(&[], &[]);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.total, 0);
    }
}
