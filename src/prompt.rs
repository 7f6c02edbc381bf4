//! Operator interaction: confirmations and selection menus.
//!
//! Everything that needs an answer from the operator goes through the
//! [`Prompt`] trait, so commands can be driven by [`ScriptedPrompt`] in tests.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Mutex;

use console::{Term, style};
use tracing::debug;

use crate::error::{Result, VkError};
use crate::interrupt::InterruptFlag;

/// Source of operator answers.
pub trait Prompt {
    /// Show `question` and return the trimmed answer line.
    fn ask(&self, question: &str) -> Result<String>;

    /// Show an informational line (menus, listings).
    fn show(&self, line: &str);
}

/// Prompts on stderr and reads answers from stdin.
pub struct TerminalPrompt {
    term: Term,
    interrupt: Option<InterruptFlag>,
}

impl TerminalPrompt {
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            interrupt: None,
        }
    }

    /// Turn a Ctrl+C pressed while waiting for an answer into
    /// [`VkError::Interrupted`].
    ///
    /// stdin reads are restarted after SIGINT, so the interrupt is noticed
    /// once the pending line is submitted.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    fn check_interrupt(&self) -> Result<()> {
        self.interrupt.as_ref().map_or(Ok(()), InterruptFlag::check)
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&self, question: &str) -> Result<String> {
        self.check_interrupt()?;
        let mut term = &self.term;
        write!(term, "{} ", style(question).bold())?;
        term.flush()?;

        let mut line = String::new();
        let read = match std::io::stdin().lock().read_line(&mut line) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                return Err(VkError::Interrupted);
            }
            Err(e) => return Err(e.into()),
        };
        self.check_interrupt()?;
        if read == 0 {
            return Err(VkError::UserAbort("no input".to_string()));
        }
        debug!(answer = line.trim(), "Operator answered");
        Ok(line.trim().to_string())
    }

    fn show(&self, line: &str) {
        // Nothing useful to do if stderr is gone.
        let _ = self.term.write_line(line);
    }
}

/// Answers from a fixed script; records everything shown.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    shown: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            shown: Mutex::new(Vec::new()),
        }
    }

    /// Questions and lines shown so far.
    #[must_use]
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Answers not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or_default()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, question: &str) -> Result<String> {
        self.show(question);
        self.answers
            .lock()
            .map_err(|_| VkError::Other("prompt script poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| VkError::UserAbort("no scripted answer left".to_string()))
    }

    fn show(&self, line: &str) {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(line.to_string());
        }
    }
}

/// Answer to an overwrite question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteAnswer {
    Yes,
    No,
    /// Yes, and stop asking for the rest of the batch.
    All,
}

/// Yes/no question; anything but `y`/`yes` means no.
pub fn confirm(prompt: &dyn Prompt, question: &str) -> Result<bool> {
    let answer = prompt.ask(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// `y`/`n`/`all` question, `n` by default. Other answers are asked again.
pub fn overwrite(prompt: &dyn Prompt, question: &str) -> Result<OverwriteAnswer> {
    loop {
        let answer = prompt.ask(&format!("{question} (y, n, all) [n]"))?;
        match answer.to_ascii_lowercase().as_str() {
            "" | "n" => return Ok(OverwriteAnswer::No),
            "y" => return Ok(OverwriteAnswer::Yes),
            "all" => return Ok(OverwriteAnswer::All),
            other => {
                debug!(answer = other, "Unrecognized overwrite answer");
                prompt.show(&format!("Error: '{other}' is not one of y, n, all."));
            }
        }
    }
}

/// Numbered menu; returns the zero-based index of the chosen entry.
///
/// Answers outside `1..=items.len()` are reported and asked again.
pub fn select(prompt: &dyn Prompt, title: &str, items: &[String], question: &str) -> Result<usize> {
    if items.is_empty() {
        return Err(VkError::UserAbort(format!("nothing to choose from: {title}")));
    }

    prompt.show(title);
    prompt.show(&"─".repeat(80));
    for (idx, item) in items.iter().enumerate() {
        prompt.show(&format!("{:5}  {item}", idx + 1));
    }

    loop {
        let answer = prompt.ask(&format!("{question} (ctrl+c to abort)"))?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
            Ok(n) => prompt.show(&format!("Error: selected index {n} is out-of-range!")),
            Err(_) => prompt.show(&format!("Error: '{answer}' is not a number.")),
        }
    }
}

/// Like [`select`], returning the chosen entry.
pub fn choose(prompt: &dyn Prompt, title: &str, items: &[String], question: &str) -> Result<String> {
    let idx = select(prompt, title, items, question)?;
    Ok(items[idx].clone())
}

/// One of a fixed set of answers; others are asked again.
pub fn one_of(prompt: &dyn Prompt, question: &str, choices: &[&str]) -> Result<String> {
    loop {
        let answer = prompt.ask(question)?;
        if let Some(choice) = choices.iter().find(|c| c.eq_ignore_ascii_case(&answer)) {
            return Ok((*choice).to_string());
        }
        prompt.show(&format!("Error: choose one of {}", choices.join("/")));
    }
}
