//! Presentation channels. The interactive terminal is the only channel in
//! this build.

pub mod cli;
