// SPDX-License-Identifier: GPL-3.0-only

pub mod client_management;
pub mod core;
pub mod handlers;
pub mod types;
