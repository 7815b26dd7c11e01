use std::io::{self, Read};

/// Default reporting interval: 8 MiB
pub const DEFAULT_FREQUENCY: u64 = 8 * 1024 * 1024;

/// Wraps a reader and reports how far into the stream we are.
///
/// `on_progress` receives the running byte total each time that total crosses
/// a multiple of `frequency`. A single large read that crosses several
/// multiples reports once per multiple.
#[derive(Debug)]
pub struct InstrumentedReader<R, F>
where
    R: Read,
    F: FnMut(u64),
{
    inner: R,
    on_progress: F,
    frequency: u64,
    total_read: u64,
    next_report: u64,
}

impl<R, F> InstrumentedReader<R, F>
where
    R: Read,
    F: FnMut(u64),
{
    pub fn new(inner: R, on_progress: F) -> Self {
        Self::with_frequency(inner, DEFAULT_FREQUENCY, on_progress)
    }

    /// A `frequency` of 0 falls back to [`DEFAULT_FREQUENCY`].
    pub fn with_frequency(inner: R, frequency: u64, on_progress: F) -> Self {
        let frequency = if frequency == 0 { DEFAULT_FREQUENCY } else { frequency };
        Self {
            inner,
            on_progress,
            frequency,
            total_read: 0,
            next_report: frequency,
        }
    }

    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    fn report(&mut self) {
        while self.total_read >= self.next_report {
            (self.on_progress)(self.total_read);
            match self.next_report.checked_add(self.frequency) {
                Some(next) => self.next_report = next,
                None => {
                    self.next_report = u64::MAX;
                    break;
                }
            }
        }
    }
}

impl<R, F> Read for InstrumentedReader<R, F>
where
    R: Read,
    F: FnMut(u64),
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.total_read = self.total_read.saturating_add(n as u64);
            self.report();
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Cursor};

    #[test]
    fn reports_each_crossed_multiple() {
        let data = vec![b'x'; 100];
        let mut hits = Vec::new();

        let mut reader = InstrumentedReader::with_frequency(Cursor::new(data), 30, |n| hits.push(n));
        let mut buf = [0u8; 45];
        while reader.read(&mut buf).unwrap() > 0 {}
        assert_eq!(reader.total_read(), 100);
        drop(reader);

        // reads land at 45, 90, 100: crossing 30 | 60, 90 | none
        assert_eq!(hits, vec![45, 90, 90]);
    }

    #[test]
    fn zero_frequency_uses_default() {
        let data = vec![0u8; DEFAULT_FREQUENCY as usize + 1];
        let mut count = 0;
        let mut reader = InstrumentedReader::with_frequency(Cursor::new(data), 0, |_| count += 1);
        io::copy(&mut reader, &mut io::sink()).unwrap();
        drop(reader);
        assert_eq!(count, 1);
    }

    #[test]
    fn counts_bytes_through_a_line_reader() {
        let text = "x y\n0 0.0\n1 -1.0\n";
        let mut reader = BufReader::new(InstrumentedReader::new(Cursor::new(text), |_| {}));
        let mut lines = 0;
        let mut line = Vec::new();
        while reader.read_until(b'\n', &mut line).unwrap() > 0 {
            lines += 1;
            line.clear();
        }
        assert_eq!(lines, 3);
        assert_eq!(reader.get_ref().total_read(), text.len() as u64);
    }
}
