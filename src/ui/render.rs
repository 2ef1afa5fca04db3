use std::cell::RefCell;
use std::io::{self, Write};

use super::form::FormField;
use super::message::MessageView;

/// Draws what the [`UiController`](super::UiController) renders
pub trait Renderer {
    /// A form field was added to the `target_id` placeholder
    fn render_field(&self, target_id: &str, field: &FormField) -> io::Result<()>;

    /// A message was appended to the `target_id` placeholder
    fn render_message(&self, target_id: &str, message: &MessageView) -> io::Result<()>;

    /// The form controls were enabled or disabled
    fn form_disabled_changed(&self, disabled: bool) -> io::Result<()>;
}

/// Line-oriented renderer for terminals
pub struct TerminalRenderer<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render_field(&self, _target_id: &str, field: &FormField) -> io::Result<()> {
        // Only text fields with a hint are worth showing; the button is Enter
        if let Some(placeholder) = field.placeholder() {
            let mut out = self.out.borrow_mut();
            writeln!(out, "  {} [{}]", placeholder, field.value())?;
            out.flush()?;
        }
        Ok(())
    }

    fn render_message(&self, _target_id: &str, message: &MessageView) -> io::Result<()> {
        let mut out = self.out.borrow_mut();
        let time = message.displayed_at.format("%H:%M:%S");
        if message.is_received() {
            writeln!(out, "[{}] {}: {}", time, message.sender, message.text)?;
        } else {
            writeln!(out, "[{}] > {}", time, message.text)?;
        }
        out.flush()
    }

    fn form_disabled_changed(&self, disabled: bool) -> io::Result<()> {
        let mut out = self.out.borrow_mut();
        if disabled {
            writeln!(out, "-- offline, input disabled --")?;
        } else {
            writeln!(out, "-- connected, type a message (/name <name> renames, /quit exits) --")?;
        }
        out.flush()
    }
}
