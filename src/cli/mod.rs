//! Terminal front end: prompts and rendering.

pub mod console;
pub mod prompt;

pub use console::{ConsoleObserver, render_header, render_summary, render_validation};
pub use prompt::{PresetValues, Prompter};
