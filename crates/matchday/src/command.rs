//! User command grammar.
//!
//! Commands are whitespace-delimited; the first token is the verb.

use std::path::PathBuf;

use crate::error::CommandError;

/// A parsed user command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Login {
        host_port: String,
        username: String,
        password: String,
    },
    Join {
        game: String,
    },
    Exit {
        game: String,
    },
    Logout,
    Report {
        path: PathBuf,
    },
    Summary {
        game: String,
        user: String,
        output: PathBuf,
    },
}

const LOGIN_USAGE: &str = "login <host:port> <username> <password>";
const JOIN_USAGE: &str = "join <game_name>";
const EXIT_USAGE: &str = "exit <game_name>";
const REPORT_USAGE: &str = "report <file>";
const SUMMARY_USAGE: &str = "summary <game_name> <user> <file>";

impl UserCommand {
    /// Parse one command line.
    ///
    /// Blank lines and unrecognized verbs yield `Ok(None)`. Extra trailing
    /// tokens are ignored.
    pub fn parse(line: &str) -> Result<Option<UserCommand>, CommandError> {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Ok(None);
        };

        let command = match verb {
            "login" => {
                let mut next = |argument: &'static str| {
                    required(&mut tokens, "login", argument, LOGIN_USAGE)
                };
                UserCommand::Login {
                    host_port: next("host:port")?,
                    username: next("username")?,
                    password: next("password")?,
                }
            }
            "join" => UserCommand::Join {
                game: required(&mut tokens, "join", "game_name", JOIN_USAGE)?,
            },
            "exit" => UserCommand::Exit {
                game: required(&mut tokens, "exit", "game_name", EXIT_USAGE)?,
            },
            "logout" => UserCommand::Logout,
            "report" => UserCommand::Report {
                path: required(&mut tokens, "report", "file", REPORT_USAGE)?.into(),
            },
            "summary" => {
                let mut next = |argument: &'static str| {
                    required(&mut tokens, "summary", argument, SUMMARY_USAGE)
                };
                UserCommand::Summary {
                    game: next("game_name")?,
                    user: next("user")?,
                    output: next("file")?.into(),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn required<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
    usage: &'static str,
) -> Result<String, CommandError> {
    tokens
        .next()
        .map(str::to_string)
        .ok_or(CommandError::MissingArgument {
            command,
            argument,
            usage,
        })
}
