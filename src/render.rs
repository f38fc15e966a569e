//! Seam between the conversation core and whatever draws it.

use crate::error::WidgetError;
use crate::events::EntryRole;

/// Presentation collaborator driven by the conversation controller
pub trait Renderer {
    /// Append one entry to the visible conversation
    fn render_entry(&mut self, role: EntryRole, text: &str);

    /// Drop every rendered entry; used before a full re-render
    fn clear_entries(&mut self);

    /// Show a user-visible failure cue
    fn show_error(&mut self, error: &WidgetError);

    fn set_input_enabled(&mut self, enabled: bool);

    fn scroll_to_latest(&mut self);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render_entry(&mut self, role: EntryRole, text: &str) {
        (**self).render_entry(role, text)
    }

    fn clear_entries(&mut self) {
        (**self).clear_entries()
    }

    fn show_error(&mut self, error: &WidgetError) {
        (**self).show_error(error)
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        (**self).set_input_enabled(enabled)
    }

    fn scroll_to_latest(&mut self) {
        (**self).scroll_to_latest()
    }
}
