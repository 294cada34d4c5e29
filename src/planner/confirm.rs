//! Confirmation gate between planning and applying.

use std::io::{BufRead, Write};

use crate::error::Result;

/// Decides whether a rendered plan may be applied.
pub trait Confirmation {
    /// Asks once; `true` approves the plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be asked.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Approves every plan without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl Confirmation for AutoApprove {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Asks on `output` and reads a `y`/`yes` answer from `input`.
///
/// Anything else, including end of input, declines.
#[derive(Debug)]
pub struct PromptConfirmation<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    /// Creates a prompt over the given streams.
    #[must_use]
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirmation<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts on stderr so stdout only carries the plan.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirmation for PromptConfirmation<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        write!(self.output, "{prompt} [y/N]: ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }
}
