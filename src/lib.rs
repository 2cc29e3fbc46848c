//! Business rules engine for multi-venue hospitality businesses.
//!
//! This crate provides the rule engines behind a hospitality back office:
//! structured identifiers for companies, venues, work areas and employees,
//! Australian payroll (income tax, Medicare levy, superannuation, payslips,
//! state payroll tax), leave accrual, a scoped role hierarchy with cached
//! permission checks, and rate-limited employee sign-in.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod permissions;
pub mod security;
