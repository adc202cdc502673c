use log::Level;

/// Destination for the store's human-readable diagnostics.
pub trait AuditSink {
    fn log(&self, level: Level, msg: &str);
}

/// Forwards diagnostics to the `log` facade under the `efivarstore` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl AuditSink for LogSink {
    fn log(&self, level: Level, msg: &str) {
        log::log!(target: "efivarstore", level, "{msg}");
    }
}
