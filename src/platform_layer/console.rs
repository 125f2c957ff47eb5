/*
 * Terminal front end. Translates the `UiCommand`s queued by the application
 * logic into lines of text. Views (category list, item options, report,
 * status) are only printed in `RenderMode::Full`; messages are always
 * printed, prefixed by their severity when it is not informational.
 *
 * Dropdown options have no terminal counterpart and are skipped.
 */
use super::types::{CategoryListEntry, MessageSeverity, PlatformEventHandler, UiCommand};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Full,
    MessagesOnly,
}

pub struct ConsoleRenderer<W: Write> {
    out: W,
    mode: RenderMode,
    problems: usize,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        ConsoleRenderer::new(io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        ConsoleRenderer {
            out,
            mode: RenderMode::Full,
            problems: 0,
        }
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    // Number of warning or error messages rendered so far.
    pub fn problems(&self) -> usize {
        self.problems
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_entries(&mut self, entries: &[CategoryListEntry]) -> io::Result<()> {
        if entries.is_empty() {
            return writeln!(self.out, "(no categories)");
        }
        for entry in entries {
            if entry.items.is_empty() {
                writeln!(self.out, "{} (0)", entry.name)?;
            } else {
                writeln!(
                    self.out,
                    "{} ({}): {}",
                    entry.name,
                    entry.items.len(),
                    entry.items.join(", ")
                )?;
            }
        }
        Ok(())
    }

    pub fn render(&mut self, command: &UiCommand) -> io::Result<()> {
        let full = self.mode == RenderMode::Full;
        match command {
            UiCommand::RenderCategoryList { entries } if full => self.write_entries(entries),
            UiCommand::RenderItemOptions { category, items } if full => {
                writeln!(self.out, "[{category}]")?;
                if items.is_empty() {
                    writeln!(self.out, "  (no items)")
                } else {
                    items
                        .iter()
                        .try_for_each(|item| writeln!(self.out, "  {item}"))
                }
            }
            UiCommand::ShowReport { text } if full => {
                if text.is_empty() {
                    writeln!(self.out, "(empty catalog)")
                } else {
                    writeln!(self.out, "{text}")
                }
            }
            UiCommand::SetStatusText { text } if full => writeln!(self.out, "{text}"),
            UiCommand::ShowMessage { text, severity } => match severity {
                MessageSeverity::Information => writeln!(self.out, "{text}"),
                MessageSeverity::Warning => {
                    self.problems += 1;
                    writeln!(self.out, "warning: {text}")
                }
                MessageSeverity::Error => {
                    self.problems += 1;
                    writeln!(self.out, "error: {text}")
                }
            },
            other => {
                log::trace!("ConsoleRenderer: Skipping {other:?}");
                Ok(())
            }
        }
    }

    // Renders every command the handler has queued, in order.
    pub fn drain(&mut self, handler: &mut dyn PlatformEventHandler) -> io::Result<()> {
        while let Some(command) = handler.try_dequeue_command() {
            self.render(&command)?;
        }
        self.out.flush()
    }
}
