use std::io::Write;
use std::sync::Mutex;

use log::{debug, warn};

use crate::data_capture::types::RoundResult;

const OK_GLYPH: &str = "\u{2714}";
const FAIL_GLYPH: &str = "\u{2716}";

/// Renders one status line per round onto a shared output stream.
///
/// Overlapping rounds share the sink; the mutex keeps each line whole.
pub struct StatusReporter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl StatusReporter {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Formats `result` without writing it.
    ///
    /// `[2025-03-14 08:00:15] round 1f0c2a9e 1/2 | ✔ TTH 29.4 ✖ TTH 29.5(timeout)`
    pub fn render(result: &RoundResult) -> String {
        let cameras: Vec<String> = result
            .outcomes
            .iter()
            .map(|o| match o.error_kind {
                _ if o.succeeded => format!("{} {}", OK_GLYPH, o.code),
                Some(kind) => format!("{} {}({})", FAIL_GLYPH, o.code, kind),
                None => format!("{} {}", FAIL_GLYPH, o.code),
            })
            .collect();
        let round_id = result.round_id.simple().to_string();

        format!(
            "[{}] round {} {}/{} | {}",
            result.started_at.format("%Y-%m-%d %H:%M:%S"),
            &round_id[..8],
            result.successes(),
            result.total(),
            cameras.join(" ")
        )
    }

    /// Machine-readable form of `result`, logged at debug level.
    pub fn render_json(result: &RoundResult) -> Result<String, serde_json::Error> {
        serde_json::to_string(result)
    }

    /// Writes the status line of `result`. Output errors are logged, never raised.
    pub fn report(&self, result: &RoundResult) {
        let line = Self::render(result);
        if log::log_enabled!(log::Level::Debug) {
            match Self::render_json(result) {
                Ok(json) => debug!("[{}] {}", result.round_id, json),
                Err(e) => warn!("[{}] Unable to serialize round: {}", result.round_id, e),
            }
        }

        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
            warn!("[{}] Unable to write status line: {}", result.round_id, e);
        }
    }
}
