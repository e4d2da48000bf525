//! Delvebot - autonomous agent for an on-chain dungeon crawler
//!
//! The engine reads authoritative game state from a chain node, models combat
//! outcomes with Monte Carlo sampling, decides the next action with a rule-based
//! policy, and submits session-signed transactions to execute it.

pub mod chain;
pub mod core;
pub mod evaluator;
pub mod executor;
pub mod model;
pub mod phase;
pub mod runner;
pub mod signing;
pub mod strategy;
pub mod telemetry;
