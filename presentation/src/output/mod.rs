//! Report formatting

pub mod console;
pub mod formatter;
pub mod json;

/// Enable or disable colored output for the whole process
pub fn set_color(enabled: bool) {
    if !enabled {
        colored::control::set_override(false);
    }
}
