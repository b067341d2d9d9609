//! The render port.
//!
//! The engine owns *what* is shown (redaction, affordance gating, status
//! transitions) and the view owns *how*. A DOM renderer, a TUI, or the
//! recording harness used in tests all sit behind this trait.

use crate::error::ConnectorError;
use crate::events::StatusLine;
use crate::types::{BoardLimits, RenderedMessage};

pub trait BoardView: Send + Sync {
    fn set_status(&self, status: StatusLine);

    /// Advisory limits fetched on retarget, for display next to the compose
    /// box.
    fn show_limits(&self, limits: &BoardLimits);

    /// Drops everything currently rendered. Always followed by a fresh page
    /// load; the engine never patches rendered entries in place.
    fn clear_messages(&self);

    /// Appends one message to the rendered list.
    fn render_message(&self, message: &RenderedMessage);

    /// Surfaces an actionable error to the user.
    fn show_error(&self, error: &ConnectorError);
}
