//! Line-oriented command script parsing.
//!
//! # Responsibility
//! - Turn one script line into a typed `Command`.
//! - Keep handle tokens (`i<N>`, `b<N>`) syntax in one place.
//!
//! # Invariants
//! - Blank lines and `#` comments parse to `None`.
//! - Keywords are case-insensitive; handle tokens are not.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static HANDLE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<kind>[ib])(?P<index>\d{1,10})$").expect("handle token regex must compile")
});

/// Entity named by a script token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// N-th item created since the last teardown.
    Item(u32),
    /// Bag with id N.
    Bag(u32),
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item(index) => write!(f, "i{index}"),
            Self::Bag(index) => write!(f, "b{index}"),
        }
    }
}

/// One script command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Item,
    Bag,
    Insert { entity: Target, bag: u32 },
    Remove(Target),
    Locate(Target),
    Count(u32),
    Invert(u32),
    Total,
    Dump,
    Audit,
    Teardown,
}

/// Parse failure with 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl Error for ScriptError {}

/// Parses one line. Returns `Ok(None)` for blank lines and comments.
pub fn parse_line(line_no: usize, raw: &str) -> Result<Option<Command>, ScriptError> {
    let content = raw.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }

    let fail = |message: String| ScriptError {
        line: line_no,
        message,
    };
    let mut words = content.split_whitespace();
    let keyword = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let expect_args = |count: usize| -> Result<(), ScriptError> {
        if args.len() == count {
            Ok(())
        } else {
            Err(fail(format!(
                "`{keyword}` takes {count} argument(s), got {}",
                args.len()
            )))
        }
    };

    let command = match keyword.as_str() {
        "item" => {
            expect_args(0)?;
            Command::Item
        }
        "bag" => {
            expect_args(0)?;
            Command::Bag
        }
        "insert" => {
            expect_args(2)?;
            Command::Insert {
                entity: parse_target(args[0]).map_err(fail)?,
                bag: parse_bag(args[1]).map_err(fail)?,
            }
        }
        "remove" => {
            expect_args(1)?;
            Command::Remove(parse_target(args[0]).map_err(fail)?)
        }
        "locate" => {
            expect_args(1)?;
            Command::Locate(parse_target(args[0]).map_err(fail)?)
        }
        "count" => {
            expect_args(1)?;
            Command::Count(parse_bag(args[0]).map_err(fail)?)
        }
        "invert" => {
            expect_args(1)?;
            Command::Invert(parse_bag(args[0]).map_err(fail)?)
        }
        "total" => {
            expect_args(0)?;
            Command::Total
        }
        "dump" => {
            expect_args(0)?;
            Command::Dump
        }
        "audit" => {
            expect_args(0)?;
            Command::Audit
        }
        "teardown" => {
            expect_args(0)?;
            Command::Teardown
        }
        other => return Err(fail(format!("unknown command `{other}`"))),
    };
    Ok(Some(command))
}

fn parse_target(token: &str) -> Result<Target, String> {
    let captures = HANDLE_TOKEN
        .captures(token)
        .ok_or_else(|| format!("expected `i<N>` or `b<N>`, got `{token}`"))?;
    let index: u32 = captures["index"]
        .parse()
        .map_err(|_| format!("handle index out of range in `{token}`"))?;
    match &captures["kind"] {
        "i" => Ok(Target::Item(index)),
        _ => Ok(Target::Bag(index)),
    }
}

fn parse_bag(token: &str) -> Result<u32, String> {
    match parse_target(token)? {
        Target::Bag(index) => Ok(index),
        Target::Item(_) => Err(format!("expected a bag token `b<N>`, got `{token}`")),
    }
}
