//! Terminal presentation of the widget

pub mod app;
pub mod composer;
pub mod panel;

pub use app::run;
pub use composer::{Composer, ComposerResult};
pub use panel::{PanelView, TerminalRenderer};
