// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;

use clap::ValueHint;
use clap::{ArgAction, Command, arg, command, value_parser};
use std::sync::LazyLock;

pub static DEFAULT_SOCKET_PATH: LazyLock<PathBuf> =
    LazyLock::new(lexfix_shared::validation::get_secure_socket_path);
pub static DEFAULT_SOCKET_PATH_STR: LazyLock<String> =
    LazyLock::new(|| DEFAULT_SOCKET_PATH.to_string_lossy().into_owned());

fn socket_arg() -> clap::Arg {
    arg!(-s --socket <socket> "The daemon socket path")
        .default_value(DEFAULT_SOCKET_PATH_STR.as_str())
        .value_parser(value_parser!(PathBuf))
        .value_hint(ValueHint::AnyPath)
}

#[must_use]
pub fn build() -> Command {
    command!()
    .about("🗣️ Lexfix - Pronunciation scoring for language learners")
    .long_about(
        "Scores speech-recognition transcripts against the word or phrase a learner was asked to say. Runs as a daemon serving scoring requests via Unix domain socket, or scores directly from the command line."
    )
    .subcommand_required(false)
    .arg_required_else_help(false)
    .subcommand(
        Command::new("score")
            .about("🎯 Score one utterance against a target word")
            .arg(arg!(<spoken> "What the recognizer heard"))
            .arg(arg!(<target> "What the learner was asked to say"))
            .arg(
                arg!(-c --confidence <confidence> "Recognizer confidence (0-1)")
                .default_value("1.0")
                .value_parser(value_parser!(f64))
            )
            .arg(
                arg!(-d --daemon "Ask the running daemon instead of scoring locally")
                .action(ArgAction::SetTrue)
            )
            .arg(socket_arg())
    )
    .subcommand(
        Command::new("evaluate")
            .about("📝 Word-by-word evaluation of a spoken sentence")
            .arg(arg!(<spoken> "What the recognizer heard"))
            .arg(arg!(<expected> "The sentence the learner was asked to say"))
            .arg(
                arg!(-d --daemon "Ask the running daemon instead of evaluating locally")
                .action(ArgAction::SetTrue)
            )
            .arg(socket_arg())
    )
    .subcommand(
        Command::new("ping")
            .about("🏓 Check if daemon is running")
            .long_about("Test connectivity to the daemon service.")
            .arg(socket_arg())
    )
    .subcommand(
        Command::new("status")
            .about("📊 Get daemon status")
            .long_about("Get uptime, request count and the active scoring policy from the daemon.")
            .arg(socket_arg())
    )
    .arg(socket_arg())
    .arg(
        arg!(--"pass-threshold" <threshold> "Minimum score counted as a pass")
        .required(false)
        .value_parser(value_parser!(u8).range(0..=100))
    )
    .arg(
        arg!(--config <path> "Daemon config file")
        .required(false)
        .value_parser(value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
    )
    .arg(
        arg!(-v --verbose "Enable verbose logging")
        .action(ArgAction::SetTrue)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        build().debug_assert();
    }

    #[test]
    fn test_score_subcommand() {
        let matches = build()
            .try_get_matches_from(["lexfix", "score", "hellos", "hello", "-c", "0.9"])
            .unwrap();
        let score = matches.subcommand_matches("score").unwrap();
        assert_eq!(score.get_one::<String>("spoken").unwrap(), "hellos");
        assert_eq!(score.get_one::<String>("target").unwrap(), "hello");
        assert!((score.get_one::<f64>("confidence").unwrap() - 0.9).abs() < f64::EPSILON);
        assert!(!score.get_flag("daemon"));
    }

    #[test]
    fn test_pass_threshold_range() {
        assert!(
            build()
                .try_get_matches_from(["lexfix", "--pass-threshold", "101"])
                .is_err()
        );
        let matches = build()
            .try_get_matches_from(["lexfix", "--pass-threshold", "80"])
            .unwrap();
        assert_eq!(matches.get_one::<u8>("pass-threshold"), Some(&80));
    }
}
