//! Log-sink credential redaction
//!
//! The platform credential must never reach a log line. Redaction happens
//! at the sink — every formatted line passes through a scrubber before it
//! is written — so no individual call site has to remember to redact.

use regex::Regex;
use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Shapes that look like platform credentials: numeric-id:token pairs and
/// long bearer-style secrets.
fn credential_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d{6,12}:[A-Za-z0-9_-]{24,}\b|\b[A-Za-z0-9_-]{40,}\b")
            .expect("hard-coded regex compiles")
    })
}

/// Replace credential-shaped substrings with `[REDACTED]`
pub fn scrub(line: &str) -> Cow<'_, str> {
    credential_re().replace_all(line, "[REDACTED]")
}

/// Writer wrapper that scrubs each chunk before passing it on
pub struct RedactingWriter<W> {
    inner: W,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.inner.write_all(scrub(&text).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// `MakeWriter` adapter installing [`RedactingWriter`] over any sink
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
        }
    }
}

/// Initialize tracing with env-filter levels and sink-side redaction.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(RedactingMakeWriter::new(io::stdout as fn() -> io::Stdout))
        .try_init();
}
