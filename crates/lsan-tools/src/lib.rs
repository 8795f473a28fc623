//! Scoring and preprocessing tools for Social and Affective Neuroscience Lab
//! studies: questionnaire scoring from tabular survey exports, subject
//! selection, BIDS event-timing extraction and a few numeric helpers used in
//! downstream analyses.

pub mod config;
pub mod error;
pub mod maths;
pub mod survey;
pub mod telemetry;
pub mod timing;
