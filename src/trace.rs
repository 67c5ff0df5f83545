/// Destination for the engine's line-oriented diagnostics.
///
/// Lines are human-readable and unversioned; they are meant for eyes and
/// logs, never for parsing.
pub trait TraceSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Default sink: one diagnostic per line on standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl TraceSink for StderrSink {
    fn line(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// Forwards diagnostics to the `tracing` facade at debug level, for hosts
/// that already run a subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn line(&self, line: &str) {
        tracing::debug!(target: "blendcore", "{}", line);
    }
}
