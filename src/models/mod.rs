// src/models/mod.rs

pub mod answer_record;
pub mod exam;
pub mod exam_record;
pub mod question;
pub mod session;
pub mod stats;
pub mod user;
