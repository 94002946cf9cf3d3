//! QaBridge CLI
//!
//! Runs the homepage search check and files ZenTao bugs for failed results.

pub mod commands;
pub mod output;
