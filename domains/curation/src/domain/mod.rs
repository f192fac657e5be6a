//! Curation domain layer: rubric, scoring, state machines, decision policy,
//! entities, input validation, and the project aggregate

pub mod aggregate;
pub mod decision;
pub mod entities;
pub mod rubric;
pub mod scoring;
pub mod state;
pub mod validation;
