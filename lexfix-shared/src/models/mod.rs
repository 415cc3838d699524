// SPDX-License-Identifier: GPL-3.0-only
pub mod feedback;
pub mod protocol;
pub mod utterance;
