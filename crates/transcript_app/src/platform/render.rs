use std::io::{self, Write};

use transcript_core::{AppViewModel, Generation, ModalPhase, ResultEntry};
use transcript_engine::result_entry_html;

use super::cli::OutputFormat;

/// Writes view changes to a terminal: status to one stream, results to another.
///
/// Results are printed once each as they arrive; a new search generation
/// starts a fresh results list.
pub struct TerminalRenderer {
    format: OutputFormat,
    phase: ModalPhase,
    generation: Option<Generation>,
    status_line: String,
    printed: usize,
}

impl TerminalRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            phase: ModalPhase::Closed,
            generation: None,
            status_line: String::new(),
            printed: 0,
        }
    }

    pub fn render(
        &mut self,
        view: &AppViewModel,
        out: &mut impl Write,
        status: &mut impl Write,
    ) -> io::Result<()> {
        if view.phase != self.phase {
            match (self.phase, view.phase) {
                (_, ModalPhase::Closed) => writeln!(status, "Search closed")?,
                (ModalPhase::Closed, _) => writeln!(status, "Search opened")?,
                _ => {}
            }
            self.phase = view.phase;
        }

        if self.generation != Some(view.generation) {
            self.generation = Some(view.generation);
            self.status_line.clear();
            self.printed = 0;
            if !view.query.is_empty() {
                writeln!(status, "Query: {}", view.query)?;
            }
        }

        for entry in view.results.iter().skip(self.printed) {
            self.write_entry(entry, out)?;
        }
        self.printed = view.results.len();
        out.flush()?;

        if view.status_line != self.status_line {
            if !view.status_line.is_empty() {
                writeln!(status, "{}", view.status_line)?;
            }
            self.status_line.clone_from(&view.status_line);
        }
        status.flush()
    }

    fn write_entry(&self, entry: &ResultEntry, out: &mut impl Write) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(out, "{}", entry.link)?;
                writeln!(out, "    {}", entry.excerpt)
            }
            OutputFormat::Html => writeln!(
                out,
                "{}",
                result_entry_html(&entry.link, &entry.source_page, &entry.highlighted_html)
            ),
        }
    }
}
