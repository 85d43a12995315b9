//! Report rendering for `--output text|json`
//!
//! Every subcommand builds a report value and hands it to [`OutputWriter`];
//! the handlers never look at the selected format themselves.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Human-readable form of a report. JSON comes from `Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Writes reports in the format chosen on the command line.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Writes `report` to stdout.
    pub fn render<T: Render + Serialize>(&self, report: &T) -> Result<(), CliError> {
        let mut stdout = std::io::stdout().lock();
        self.render_to(&mut stdout, report)?;
        stdout.flush()?;
        Ok(())
    }

    /// Writes `report` to `w`.
    ///
    /// JSON is serialized into a buffer first so a serialization error leaves
    /// `w` untouched.
    pub fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        report: &T,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => report.render_text(w)?,
            OutputFormat::Json => {
                let mut document = serde_json::to_vec_pretty(report)?;
                document.push(b'\n');
                w.write_all(&document)?;
            }
        }
        Ok(())
    }
}
