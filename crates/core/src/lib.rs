//! Core library: cleanup, scanning, labeling, learning, organizing.

pub mod cleanup;
pub mod config;
pub mod labeler;
pub mod learning;
pub mod models;
pub mod organizer;
pub mod pipeline;
pub mod processor;
pub mod scanner;
