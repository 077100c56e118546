//! Console styles for the interactive session's output roles.

use console::StyledObject;

/// Style for echoed user input and the prompt.
pub fn user<D>(text: D) -> StyledObject<D> {
    console::style(text).cyan().bright()
}

/// Style for agent responses.
pub fn agent<D>(text: D) -> StyledObject<D> {
    console::style(text).green().bright()
}

/// Style for utensil call announcements.
pub fn utensil<D>(text: D) -> StyledObject<D> {
    console::style(text).yellow().bright()
}

/// Style for utensil results.
pub fn result<D>(text: D) -> StyledObject<D> {
    console::style(text).blue().bright()
}

/// Style for error messages.
pub fn error<D>(text: D) -> StyledObject<D> {
    console::style(text).red().bright()
}

/// Style for informational messages.
pub fn info<D>(text: D) -> StyledObject<D> {
    console::style(text).magenta().bright()
}

/// Style for horizontal rules.
pub fn separator<D>(text: D) -> StyledObject<D> {
    console::style(text).black().bright().dim()
}

/// Style for section headers.
pub fn header<D>(text: D) -> StyledObject<D> {
    console::style(text).white().bright().bold()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_styling_renders_ansi_codes() {
        let rendered = user("hello").force_styling(true).to_string();
        assert!(rendered.contains("\u{1b}["));
        assert!(rendered.contains("hello"));
    }

    #[test]
    fn text_passes_through_unchanged() {
        assert!(agent("done").to_string().contains("done"));
        assert!(error("bad").to_string().contains("bad"));
    }
}
