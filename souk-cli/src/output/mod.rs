//! Output formatting for CLI.

mod json;
mod text;

pub use json::{ErrorOutput, JsonFormatter, SessionOutput};
pub use text::TextFormatter;

use crate::{Cli, OutputFormat};

/// Renders a command failure for stderr.
pub fn render_error(error: &anyhow::Error, cli: &Cli) -> String {
    match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_error(error),
        OutputFormat::Json => {
            let output = ErrorOutput::from_error(error);
            JsonFormatter::new(cli.pretty)
                .format(&output)
                .unwrap_or_else(|_| format!("Error: {error:#}"))
        }
    }
}
