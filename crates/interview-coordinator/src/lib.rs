//! Interview coordination core.
//!
//! Matches applicants to interviewers, books conflict-free slots on interviewer
//! calendars, recommends a communication format, and drives the reminder and
//! confirmation workflow for each booked interview.

pub mod config;
pub mod coordination;
pub mod error;
pub mod telemetry;
