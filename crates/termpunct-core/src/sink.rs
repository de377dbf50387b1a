#![forbid(unsafe_code)]

//! Outgoing data sink for forwarded punctuation.

/// Receives committed punctuation that the terminal engine did not write.
///
/// Whatever carries terminal input (pty stdin, a remote session, a websocket)
/// sits behind this trait.
pub trait DataSink {
    fn write(&mut self, text: &str);
}

impl<F> DataSink for F
where
    F: FnMut(&str),
{
    fn write(&mut self, text: &str) {
        self(text);
    }
}

/// Sink that records every write in order.
///
/// Used by tests and by hosts that must deliver writes after releasing a
/// borrow on the arbiter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingSink {
    writes: Vec<String>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    /// Take all recorded writes, leaving the sink empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, String> {
        self.writes.drain(..)
    }
}

impl DataSink for RecordingSink {
    fn write(&mut self, text: &str) {
        self.writes.push(text.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_sink_forwards() {
        let mut seen = Vec::new();
        {
            let mut sink = |text: &str| seen.push(text.to_string());
            sink.write("，");
            sink.write("。");
        }
        assert_eq!(seen, vec!["，", "。"]);
    }

    #[test]
    fn recording_sink_drains_in_order() {
        let mut sink = RecordingSink::new();
        sink.write("a");
        sink.write("b");
        let drained: Vec<String> = sink.drain().collect();
        assert_eq!(drained, vec!["a", "b"]);
        assert!(sink.writes().is_empty());
    }
}
