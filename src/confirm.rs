//! Operator confirmation before destructive batches

use crate::error::{Error, Result};
use std::io::{BufRead, Write};

const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

/// Ask the operator to type `phrase` before `action` is carried out
///
/// Only the line terminator is stripped from the answer; the comparison is
/// exact and case sensitive. Anything else, including end of input, aborts
/// with [`Error::Aborted`] after telling the operator.
pub fn confirm<R, W>(input: &mut R, output: &mut W, action: &str, phrase: &str) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(
        output,
        "{RED}WARNING:{RESET} {YELLOW}You are about to {action}. This cannot be undone.{RESET}"
    )?;
    write!(
        output,
        "Type '{YELLOW}{phrase}{RESET}' (case sensitive) to proceed \
         or anything else to terminate: "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer
        .strip_suffix('\n')
        .map(|a| a.strip_suffix('\r').unwrap_or(a))
        .unwrap_or(&answer);

    if answer == phrase {
        return Ok(());
    }

    writeln!(output, "{RED}Operation terminated.{RESET}")?;
    Err(Error::Aborted(format!(
        "confirmation phrase not entered, refusing to {}",
        action
    )))
}
