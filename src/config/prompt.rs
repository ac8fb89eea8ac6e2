//! Interactive prompting used while creating or overwriting profiles.
//!
//! The credential store never talks to the terminal directly; it goes
//! through a [`Prompter`], so decision logic can run against scripted
//! answers in tests.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::Result;

/// Answer to a yes/no/cancel question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    Cancel,
}

impl Confirmation {
    /// Interpret a free-form answer. Anything unrecognized cancels.
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Confirmation::Yes,
            "n" | "no" => Confirmation::No,
            _ => Confirmation::Cancel,
        }
    }
}

/// Line-based question/answer collaborator.
pub trait Prompter {
    /// Whether a human is attached to answer questions.
    fn is_interactive(&self) -> bool;

    /// Ask a question and return the trimmed answer line.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Ask a yes/no/cancel question.
    fn confirm(&mut self, question: &str) -> Result<Confirmation> {
        let answer = self.ask(&format!("{} [y/n/c]", question))?;
        Ok(Confirmation::parse(&answer))
    }
}

/// Prompter backed by stdin/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{} ", question)?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed").into());
        }
        Ok(line.trim().to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedPrompter;
    use super::*;

    #[test]
    fn test_confirmation_parse() {
        assert_eq!(Confirmation::parse("y"), Confirmation::Yes);
        assert_eq!(Confirmation::parse(" YES "), Confirmation::Yes);
        assert_eq!(Confirmation::parse("no"), Confirmation::No);
        assert_eq!(Confirmation::parse("c"), Confirmation::Cancel);
        assert_eq!(Confirmation::parse(""), Confirmation::Cancel);
    }

    #[test]
    fn test_default_confirm_uses_ask() {
        let mut prompter = ScriptedPrompter::new(&["n"]);
        let answer = prompter.confirm("Overwrite?").unwrap();
        assert_eq!(answer, Confirmation::No);
        assert_eq!(prompter.questions, vec!["Overwrite? [y/n/c]".to_string()]);
    }
}
