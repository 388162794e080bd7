use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use armviz::{Session, SessionLog};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Collects formatted events in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A writer that always fails.
struct Broken;

impl Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under the binary's default `warn` filter and return what it logged.
fn logged_at_default_level(f: impl FnOnce()) -> String {
    let out = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_writer(out.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    out.text()
}

#[test]
fn failed_instruction_is_silent_at_default_level() {
    let text = logged_at_default_level(|| {
        let mut s = Session::default();
        assert!(s.execute("FOO r0").is_err());
        assert!(s.execute("LDR r0, =missing").is_err());
        assert!(s.execute("MOV r99, #1").is_err());
    });
    assert_eq!(text, "");
}

#[test]
fn log_write_failure_still_warns() {
    let text = logged_at_default_level(|| {
        let mut s = Session::default();
        s.attach_log(SessionLog::new(Broken));
        s.execute("MOV r0, #1").unwrap();
    });
    assert!(text.contains("WARN"), "{}", text);
    assert!(text.contains("debug log write failed"), "{}", text);
}
