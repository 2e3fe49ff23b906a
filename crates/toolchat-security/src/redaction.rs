use std::sync::LazyLock;

use regex::Regex;
use tracing_subscriber::fmt::MakeWriter;

/// Log sink that masks provider credentials before they reach the output.
pub struct RedactingWriter<W> {
    inner: W,
}

impl RedactingWriter<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self {
            inner: std::io::stderr(),
        }
    }
}

impl<W: std::io::Write> RedactingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: std::io::Write> std::io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let original = String::from_utf8_lossy(buf);
        let redacted = redact_secrets(&original);
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<'a> MakeWriter<'a> for RedactingWriter<std::io::Stderr> {
    type Writer = RedactingWriter<std::io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::stderr()
    }
}

static SECRET_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
          sk-[A-Za-z0-9_\-]{20,}          # OpenAI and DeepSeek keys
        | AIza[0-9A-Za-z_\-]{30,}         # Google API keys
        | gh[pousr]_[A-Za-z0-9]{20,}      # GitHub tokens
        | github_pat_[A-Za-z0-9_]{20,}    # GitHub fine-grained tokens
        | (?i:bearer)\s+[A-Za-z0-9._\-]{16,}
        ",
    )
    .expect("redaction regex should compile")
});

/// Replace known credential patterns with `[REDACTED]`.
pub fn redact_secrets(input: &str) -> String {
    SECRET_PATTERNS.replace_all(input, "[REDACTED]").into_owned()
}
