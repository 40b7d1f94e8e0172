//! HTML formatting of LLM replies.

use regex::Regex;

/// Turns the model's lightweight markdown into HTML for the web client.
pub struct ResponseFormatter {
    bold: Regex,
    quote: Regex,
}

impl ResponseFormatter {
    /// Compile the formatting patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bold: Regex::new(r"\*\*(.+?)\*\*")?,
            quote: Regex::new(r#""(.+?)""#)?,
        })
    }

    /// Render `**bold**` as `<strong>`, `"quotes"` as styled curly quotes and
    /// newlines as `<br>`.
    ///
    /// Both patterns match within a single line only.
    #[must_use]
    pub fn format(&self, text: &str) -> String {
        let bolded = self.bold.replace_all(text, "<strong>$1</strong>");
        let quoted = self.quote.replace_all(
            &bolded,
            r#"<span class="quote">&ldquo;$1&rdquo;</span>"#,
        );
        quoted.replace("\n\n", "<br><br>").replace('\n', "<br>")
    }
}
