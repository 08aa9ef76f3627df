//! Taskforge - Conversational ML Task Definition Service
//!
//! This crate guides users through a multi-turn dialogue that produces a
//! structured task definition (a JSON schema describing an ML task), then
//! recommends candidate pre-trained models for that task.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
