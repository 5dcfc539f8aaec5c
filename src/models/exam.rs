// src/models/exam.rs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{
    MOCK_EXAM_DURATION_MINUTES, MOCK_EXAM_QUESTIONS_PER_TYPE, PRACTICE_QUESTION_COUNT,
};
use crate::models::question::PublicQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamMode {
    /// Untimed random draw of 20 questions.
    #[default]
    Practice,
    /// 60 single + 60 multiple + 60 judge, 180 minutes.
    MockExam,
}

impl ExamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamMode::Practice => "practice",
            ExamMode::MockExam => "mock_exam",
        }
    }

    /// Time budget in minutes; 0 means unlimited.
    pub fn duration_minutes(&self) -> u32 {
        match self {
            ExamMode::Practice => 0,
            ExamMode::MockExam => MOCK_EXAM_DURATION_MINUTES,
        }
    }

    pub fn question_count(&self) -> usize {
        match self {
            ExamMode::Practice => PRACTICE_QUESTION_COUNT,
            ExamMode::MockExam => MOCK_EXAM_QUESTIONS_PER_TYPE * 3,
        }
    }
}

impl fmt::Display for ExamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practice" => Ok(ExamMode::Practice),
            "mock_exam" => Ok(ExamMode::MockExam),
            other => Err(format!("unknown exam type: {}", other)),
        }
    }
}

/// An exam being taken. Lives in the exam session store until completed or swept.
#[derive(Debug, Clone, Serialize)]
pub struct ExamInProgress {
    pub token: String,
    pub user_id: i64,
    pub mode: ExamMode,
    /// Summary row opened in the durable store at start.
    pub record_id: i64,
    /// Fixed at creation.
    pub question_ids: Vec<i64>,
    /// Latest submission per question id.
    pub answers: HashMap<i64, String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: u32,
    /// One-way flag; no answer is accepted once set.
    pub completed: bool,
}

impl ExamInProgress {
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_minutes()
    }

    pub fn is_timed(&self) -> bool {
        self.duration_minutes > 0
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_timed() && self.elapsed_minutes(now) >= i64::from(self.duration_minutes)
    }

    /// Minutes left on the clock, 0 for untimed or overdue exams.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_timed() {
            return 0;
        }
        (i64::from(self.duration_minutes) - self.elapsed_minutes(now)).max(0)
    }

    pub fn is_assigned(&self, question_id: i64) -> bool {
        self.question_ids.contains(&question_id)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartExamQuery {
    #[serde(rename = "type")]
    pub exam_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExamStarted {
    pub session_id: String,
    pub exam_type: ExamMode,
    pub questions: Vec<PublicQuestion>,
    pub duration: u32,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExamSessionView {
    pub session: ExamInProgress,
    pub questions: Vec<PublicQuestion>,
    pub remaining_time: i64,
}

/// Grading summary returned by completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score: f64,
    /// Wall-clock minutes since start.
    pub duration: i64,
    pub completed_at: DateTime<Utc>,
}
