//! HTTP handlers for the Curation domain

pub mod access;
pub mod curations;
pub mod projects;
