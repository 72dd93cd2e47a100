use thiserror::Error;
use tracker_core::{normalize_region_code, JobKey, PropertyKind};

pub const HELP: &str = "\
commands:
  add <code> [apartamento|casa]  register a postal code (default apartamento)
  retry <code>                   requeue a failed job
  remove <code>                  delete a job
  list                           print the job list again
  help                           show this text
  quit                           close every stream and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The code is passed on raw; normalisation happens in `update`.
    Add { code: String, kind: PropertyKind },
    Retry { key: JobKey },
    Remove { key: JobKey },
    List,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command `{0}`; type `help` for the list")]
    UnknownCommand(String),
    #[error("`{0}` needs a postal code")]
    MissingCode(&'static str),
    #[error("not a postal code: {0:?}")]
    InvalidCode(String),
    #[error("unknown property type `{0}`; use apartamento or casa")]
    InvalidKind(String),
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
}

/// Parses one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "add" => {
            let code = words.next().ok_or(InputError::MissingCode("add"))?;
            let kind = match words.next() {
                Some(raw) => {
                    PropertyKind::parse(raw).ok_or_else(|| InputError::InvalidKind(raw.to_string()))?
                }
                None => PropertyKind::default(),
            };
            Command::Add {
                code: code.to_string(),
                kind,
            }
        }
        "retry" => Command::Retry {
            key: code_argument("retry", words.next())?,
        },
        "remove" | "rm" => Command::Remove {
            key: code_argument("remove", words.next())?,
        },
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };

    match words.next() {
        Some(extra) => Err(InputError::UnexpectedArgument(extra.to_string())),
        None => Ok(Some(command)),
    }
}

fn code_argument(verb: &'static str, raw: Option<&str>) -> Result<JobKey, InputError> {
    let raw = raw.ok_or(InputError::MissingCode(verb))?;
    normalize_region_code(raw).ok_or_else(|| InputError::InvalidCode(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_defaults_to_apartment_and_keeps_raw_code() {
        assert_eq!(
            parse_command("add 88015-200").unwrap(),
            Some(Command::Add {
                code: "88015-200".to_string(),
                kind: PropertyKind::Apartment,
            })
        );
        assert_eq!(
            parse_command("  ADD 01310100 casa ").unwrap(),
            Some(Command::Add {
                code: "01310100".to_string(),
                kind: PropertyKind::House,
            })
        );
    }

    #[test]
    fn retry_and_remove_normalise_the_code() {
        assert_eq!(
            parse_command("retry 88015-200").unwrap(),
            Some(Command::Retry {
                key: "88015200".to_string()
            })
        );
        assert_eq!(
            parse_command("rm 88.015-200").unwrap(),
            Some(Command::Remove {
                key: "88015200".to_string()
            })
        );
    }

    #[test]
    fn simple_commands_and_blank_lines() {
        assert_eq!(parse_command("list").unwrap(), Some(Command::List));
        assert_eq!(parse_command("help").unwrap(), Some(Command::Help));
        assert_eq!(parse_command("quit").unwrap(), Some(Command::Quit));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn invalid_input_is_reported() {
        assert_eq!(
            parse_command("frobnicate"),
            Err(InputError::UnknownCommand("frobnicate".to_string()))
        );
        assert_eq!(parse_command("add"), Err(InputError::MissingCode("add")));
        assert_eq!(
            parse_command("add 88015200 castle"),
            Err(InputError::InvalidKind("castle".to_string()))
        );
        assert_eq!(
            parse_command("retry abc"),
            Err(InputError::InvalidCode("abc".to_string()))
        );
        assert_eq!(
            parse_command("list everything"),
            Err(InputError::UnexpectedArgument("everything".to_string()))
        );
    }
}
