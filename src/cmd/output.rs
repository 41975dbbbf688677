//! Mode-aware rendering of run reports and listings.
//!
//! - Human: colored status tags grouped by section
//! - Json: one pretty-printed document on stdout
//! - Quiet: only units that failed or errored, plus errors
//!
//! Colors are only used when stdout is a terminal. A custom writer can be
//! injected to capture output in tests.

use colored::{Color, Colorize};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use bakery::report::{Report, UnitOutcome};
use bakery::status::Status;

/// Output mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    Quiet,
}

#[derive(Clone)]
pub struct Output {
    mode: OutputMode,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    is_tty: bool,
}

impl Output {
    /// Create a new Output writing to stdout
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            writer: Arc::new(Mutex::new(Box::new(io::stdout()))),
            is_tty: atty::is(atty::Stream::Stdout),
        }
    }

    /// Create an Output with a custom writer (for testing)
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_writer(mode: OutputMode, writer: Box<dyn Write + Send>) -> Self {
        Self {
            mode,
            writer: Arc::new(Mutex::new(writer)),
            is_tty: false,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Plain informational line; silent outside human mode
    pub fn info(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            self.write_line(msg);
        }
    }

    /// Section heading in human mode
    pub fn heading(&self, title: &str) {
        if self.mode == OutputMode::Human {
            let title = if self.is_tty {
                title.bold().to_string()
            } else {
                title.to_string()
            };
            self.write_line(&title);
        }
    }

    /// Error line; always written, even in quiet mode
    pub fn error(&self, msg: &str) {
        let prefix = self.paint("✗", Color::Red);
        self.write_line(&format!("{} {}", prefix, msg));
    }

    pub fn success(&self, msg: &str) {
        if self.mode == OutputMode::Human {
            let prefix = self.paint("✓", Color::Green);
            self.write_line(&format!("{} {}", prefix, msg));
        }
    }

    /// Serialize any value as pretty JSON
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let rendered = serde_json::to_string_pretty(value)?;
        self.write_line(&rendered);
        Ok(())
    }

    /// Render a full run report according to the mode
    pub fn report(&self, report: &Report) -> anyhow::Result<()> {
        match self.mode {
            OutputMode::Json => return self.json(report),
            OutputMode::Quiet => {
                for unit in report.units.iter().filter(|u| u.status.is_failure()) {
                    self.write_line(&self.unit_line(unit));
                }
            }
            OutputMode::Human => {
                let mut current: Option<&str> = None;
                for unit in &report.units {
                    if current != Some(unit.section.as_str()) {
                        if current.is_some() {
                            self.write_line("");
                        }
                        self.heading(&unit.section);
                        current = Some(unit.section.as_str());
                    }
                    self.write_line(&format!("  {}", self.unit_line(unit)));
                    if unit.results.len() > 1 {
                        for result in unit.results.iter().filter(|r| r.message != unit.message) {
                            self.write_line(&format!(
                                "      {} {}",
                                self.status_tag(result.status),
                                result.message
                            ));
                        }
                    }
                }
                self.write_line("");
                self.write_line(&self.summary_line(report));
                if report.cancelled {
                    self.write_line(&format!(
                        "{} run was cancelled; undispatched units are marked SKIP",
                        self.paint("⚠", Color::Yellow)
                    ));
                }
            }
        }
        Ok(())
    }

    fn unit_line(&self, unit: &UnitOutcome) -> String {
        format!(
            "{} {} [{}]: {}",
            self.status_tag(unit.status),
            unit.check_id,
            unit.context,
            unit.message
        )
    }

    fn summary_line(&self, report: &Report) -> String {
        let parts: Vec<String> = Status::ALL
            .iter()
            .rev()
            .map(|s| format!("{} {}", report.totals.get(*s), s))
            .collect();
        format!(
            "{}: {} ({} units, {}ms)",
            report.specification,
            parts.join(", "),
            report.totals.total(),
            report.duration_ms
        )
    }

    fn status_tag(&self, status: Status) -> String {
        let tag = format!("{:<5}", status.as_str());
        let color = match status {
            Status::Skip => Color::BrightBlack,
            Status::Pass => Color::Green,
            Status::Warn => Color::Yellow,
            Status::Fail => Color::Red,
            Status::Error => Color::Magenta,
        };
        self.paint(&tag, color)
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.is_tty {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}
