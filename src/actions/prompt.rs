//! Interactive confirmation for a single duplicate pair.
//!
//! The terminal prompt asks which line of the printed pair to remove:
//!
//! ```text
//! ┌ "/data/b"
//! └ "/data/a"
//! Remove line 1, 2 or Skip ? [12S]
//! ```
//!
//! An answer is one trimmed, case-insensitive character. Answers of any
//! other length re-prompt, up to a fixed number of attempts; running out of
//! attempts, reaching end of input or failing to read all mean "skip".

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use crate::duplicates::DuplicatePair;

/// Text written before each read.
pub const PROMPT_TEXT: &str = "Remove line 1, 2 or Skip ? [12S] ";

/// Default number of attempts before giving up.
pub const DEFAULT_PROMPT_RETRIES: u32 = 3;

/// What the user chose to do with a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Delete line 1, the duplicate
    DeleteDuplicate,
    /// Delete line 2, the original
    DeleteOriginal,
    /// Leave both files alone
    Skip,
}

impl Choice {
    /// Interpret one line of input.
    ///
    /// Returns `None` when the trimmed answer is not exactly one character,
    /// which asks for a re-prompt.
    #[must_use]
    pub fn parse(answer: &str) -> Option<Self> {
        let answer = answer.trim().to_lowercase();
        let mut chars = answer.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };
        Some(match c {
            '1' => Self::DeleteDuplicate,
            '2' => Self::DeleteOriginal,
            _ => Self::Skip,
        })
    }
}

/// Source of interactive decisions.
///
/// Implementations are only ever called with the mutation lock held, so a
/// prompt never interleaves with another one or with console output.
pub trait Prompt: Send {
    /// Decide what to do with `pair`. The pair has already been printed.
    fn ask(&mut self, pair: &DuplicatePair) -> Choice;
}

/// Line-oriented prompt over any reader/writer pair.
#[derive(Debug)]
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    retries: u32,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    /// Create a prompt reading answers from `input`.
    pub fn new(input: R, output: W, retries: u32) -> Self {
        Self {
            input,
            output,
            retries,
        }
    }
}

impl TerminalPrompt<BufReader<Stdin>, Stdout> {
    /// Prompt on the process's standard input and output.
    #[must_use]
    pub fn stdio(retries: u32) -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout(), retries)
    }
}

impl<R, W> Prompt for TerminalPrompt<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn ask(&mut self, _pair: &DuplicatePair) -> Choice {
        for _ in 0..self.retries {
            if let Err(e) = write!(self.output, "{PROMPT_TEXT}").and_then(|()| self.output.flush())
            {
                log::warn!("Cannot write prompt: {e}");
                return Choice::Skip;
            }

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    log::debug!("End of input at prompt, skipping");
                    return Choice::Skip;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Cannot read answer: {e}");
                    return Choice::Skip;
                }
            }

            if let Some(choice) = Choice::parse(&line) {
                return choice;
            }
        }
        Choice::Skip
    }
}
