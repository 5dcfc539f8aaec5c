// src/services/evaluator.rs

//! Answer correctness rules, one per question type.

use std::collections::HashSet;

use crate::models::question::QuestionType;

/// Decides whether `submitted` matches `correct` for a question of the given type.
pub fn is_correct(question_type: QuestionType, submitted: &str, correct: &str) -> bool {
    match question_type {
        QuestionType::Single => single_matches(submitted, correct),
        QuestionType::Multiple => multiple_matches(submitted, correct),
        QuestionType::Judge => judge_matches(submitted, correct),
    }
}

/// Grades a possibly missing submission. Unanswered is always incorrect.
pub fn grade(question_type: QuestionType, submitted: Option<&str>, correct: &str) -> bool {
    submitted.is_some_and(|answer| is_correct(question_type, answer, correct))
}

fn single_matches(submitted: &str, correct: &str) -> bool {
    equals_ignore_case(submitted, correct)
}

fn judge_matches(submitted: &str, correct: &str) -> bool {
    equals_ignore_case(submitted, correct)
}

fn equals_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Set comparison of comma separated choices.
///
/// The part counts must match before membership is checked, and membership
/// only asks that every correct part appears among the submitted ones. So a
/// submission with a repeated choice ("A,A,B" vs "A,B") fails on length even
/// though its set matches, while "A,B" is accepted against a stored "A,A".
fn multiple_matches(submitted: &str, correct: &str) -> bool {
    let submitted_parts = choice_parts(submitted);
    let correct_parts = choice_parts(correct);

    if submitted_parts.len() != correct_parts.len() {
        return false;
    }

    let submitted_set: HashSet<&str> = submitted_parts.iter().map(String::as_str).collect();
    correct_parts
        .iter()
        .all(|part| submitted_set.contains(part.as_str()))
}

fn choice_parts(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .collect()
}
