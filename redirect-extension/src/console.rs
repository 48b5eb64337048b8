use std::io;
use tracing_subscriber::fmt::MakeWriter;

/// `MakeWriter` that hands each formatted log event to a line sink, such as
/// the browser's `console.log`.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleMakeWriter {
    sink: fn(&str),
}

impl ConsoleMakeWriter {
    pub fn new(sink: fn(&str)) -> Self {
        Self { sink }
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            sink: self.sink,
            buf: Vec::new(),
        }
    }
}

/// Buffers one event and emits it on flush or drop.
pub struct ConsoleWriter {
    sink: fn(&str),
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn emit(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end_matches('\n');
        if !line.is_empty() {
            (self.sink)(line);
        }
        self.buf.clear();
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        self.emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Write;

    thread_local! {
        static CAPTURED: RefCell<Vec<String>> = RefCell::new(Vec::new());
    }

    fn capture(line: &str) {
        CAPTURED.with(|c| c.borrow_mut().push(line.to_string()));
    }

    fn take_captured() -> Vec<String> {
        CAPTURED.with(|c| std::mem::take(&mut *c.borrow_mut()))
    }

    #[test]
    fn test_event_emitted_on_drop() {
        let make = ConsoleMakeWriter::new(capture);
        {
            let mut writer = make.make_writer();
            write!(writer, "INFO redirect_core: ").unwrap();
            writeln!(writer, "Request [1] redirected").unwrap();
        }
        assert_eq!(take_captured(), vec!["INFO redirect_core: Request [1] redirected"]);
    }

    #[test]
    fn test_flush_then_drop_emits_once() {
        let make = ConsoleMakeWriter::new(capture);
        let mut writer = make.make_writer();
        writer.write_all(b"first\n").unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert_eq!(take_captured(), vec!["first"]);
    }

    #[test]
    fn test_empty_writer_emits_nothing() {
        let make = ConsoleMakeWriter::new(capture);
        drop(make.make_writer());
        assert!(take_captured().is_empty());
    }
}
