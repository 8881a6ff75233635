use dashmap::DashMap;
use std::io::{self, Write};
use std::time::Duration;

/// Accumulated wall-clock time per profiled operation
///
/// Repeated calls of the same operation are summed. Recording is safe from
/// any number of threads at once.
#[derive(Debug, Default)]
pub struct ProfilingState {
    totals: DashMap<String, Duration>,
}

impl ProfilingState {
    /// Adds one call's elapsed time to the operation's total
    pub fn record(&self, label: &str, elapsed: Duration) {
        *self
            .totals
            .entry(label.to_string())
            .or_insert(Duration::ZERO) += elapsed;
    }

    /// Returns the total recorded for an operation, if any
    pub fn total(&self, label: &str) -> Option<Duration> {
        self.totals.get(label).map(|entry| *entry.value())
    }

    /// Writes one line per operation, sorted by label
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut entries: Vec<(String, Duration)> = self
            .totals
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (label, elapsed) in entries {
            writeln!(writer, "{}", format_record(&label, elapsed))?;
        }
        Ok(())
    }
}

/// Formats a record as `<label> took <m>m <s>s <ms>ms`
pub(crate) fn format_record(label: &str, elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    format!(
        "{} took {}m {}s {}ms",
        label,
        total_secs / 60,
        total_secs % 60,
        elapsed.subsec_millis()
    )
}
