//! Confirmation requests for operations that need an explicit "yes".
//!
//! Operations such as applying one layout to every page change what the
//! customer sees across the whole album. They ask a [`Confirmer`] before
//! touching the document instead of reaching for a global dialog, so the same
//! code runs behind a terminal prompt, a `--yes` flag or a test double.
//!
//! A [`ConfirmRequest`] only names the operation and its parameters. Wording
//! is up to whoever shows it; the terminal prompt uses
//! [`output::format_confirm_request`](crate::output::format_confirm_request).

use crate::layout::Layout;
use crate::output;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};

/// What the user is being asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmRequest {
    /// Switch every page of the album to one layout.
    ApplyLayoutToAll { layout: Layout, page_count: usize },
    /// Upload the finished design and close the editor.
    SaveAlbum,
}

/// Answers confirmation requests.
pub trait Confirmer {
    fn confirm(&self, request: &ConfirmRequest) -> bool;
}

/// Outcome of an operation gated on confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Applied,
    Declined,
}

/// Fixed answer. `AutoConfirm(true)` backs the CLI's `--yes`.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmer for AutoConfirm {
    fn confirm(&self, _request: &ConfirmRequest) -> bool {
        self.0
    }
}

/// Interactive `[y/N]` prompt on a reader/writer pair (stdin/stdout in the CLI).
///
/// Anything other than `y`/`yes` declines, including EOF and read errors.
pub struct PromptConfirmer<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl<R: BufRead, W: Write> PromptConfirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    fn ask(&self, request: &ConfirmRequest) -> io::Result<()> {
        let mut out = self.output.borrow_mut();
        for line in output::format_confirm_request(request) {
            writeln!(out, "{}", line)?;
        }
        write!(out, "Continue? [y/N] ")?;
        out.flush()
    }
}

impl PromptConfirmer<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirmer for PromptConfirmer<R, W> {
    fn confirm(&self, request: &ConfirmRequest) -> bool {
        if self.ask(request).is_err() {
            return false;
        }
        let mut answer = String::new();
        match self.input.borrow_mut().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
