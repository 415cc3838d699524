// SPDX-License-Identifier: GPL-3.0-only
pub mod cli;
pub mod config;
pub mod daemon;

// Re-export the main run function
pub use daemon_main::run;

mod daemon_main;
