//! Interactive command loop.

use core::ops::ControlFlow;
use std::io::{self, BufRead};

use anyhow::{Context, bail, ensure};

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { object: String, quantity: i64 },
    Take { object: String, quantity: i64 },
    Print,
    Exit,
}

/// Read stdin line by line, handing each trimmed line to `on_line` until it
/// breaks or input ends.
pub fn scan_lines(
    mut on_line: impl FnMut(&str) -> anyhow::Result<ControlFlow<()>>,
) -> anyhow::Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading input")?;
        if on_line(line.trim())?.is_break() {
            break;
        }
    }
    Ok(())
}

/// Parse one command line: `put|take <quantity> <object>`, `print`, `exit`.
pub fn parse_command(line: &str) -> anyhow::Result<Command> {
    let mut parts = line.split_whitespace();
    let op = parts.next().unwrap_or_default();

    match op {
        "print" => Ok(Command::Print),
        "exit" => Ok(Command::Exit),
        "put" | "take" => {
            let quantity = parts
                .next()
                .with_context(|| format!("usage: {op} <quantity> <object>"))?;
            let quantity: i64 = quantity
                .parse()
                .with_context(|| format!("parsing quantity {quantity:?}"))?;
            let object = parts
                .next()
                .with_context(|| format!("usage: {op} <quantity> <object>"))?
                .to_string();
            ensure!(parts.next().is_none(), "trailing input after object");

            Ok(if op == "put" {
                Command::Put { object, quantity }
            } else {
                Command::Take { object, quantity }
            })
        }
        other => bail!("unknown command {other:?}, use put/take/print/exit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_put_and_take() {
        assert_eq!(
            parse_command("put 5 apple").unwrap(),
            Command::Put {
                object: "apple".to_string(),
                quantity: 5
            }
        );
        assert_eq!(
            parse_command("take 2 pear").unwrap(),
            Command::Take {
                object: "pear".to_string(),
                quantity: 2
            }
        );
    }

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse_command("print").unwrap(), Command::Print);
        assert_eq!(parse_command("exit").unwrap(), Command::Exit);
    }

    #[test]
    fn rejects_incomplete_input() {
        assert!(parse_command("put").is_err());
        assert!(parse_command("put 5").is_err());
        assert!(parse_command("put five apple").is_err());
        assert!(parse_command("put 5 apple extra").is_err());
        assert!(parse_command("drop 5 apple").is_err());
    }
}
