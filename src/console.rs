use std::io::{self, BufRead, Write};

/// Input and output for `print` and the `read-*` forms.
///
/// Input is consumed in whitespace-delimited tokens by `next_token` and in
/// lines by `read_line`. A line partly consumed by `next_token` is finished
/// off by the next `read_line` only if something other than whitespace is
/// left on it; otherwise `read_line` moves on to a fresh line.
pub struct Console {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    pending: String,
}

impl Console {
    pub fn new(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            pending: String::new(),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }

    fn fill(&mut self) -> io::Result<bool> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        let trimmed_len = line.trim_end_matches(|c| c == '\n' || c == '\r').len();
        line.truncate(trimmed_len);
        self.pending = line;
        Ok(true)
    }

    /// Returns `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let rest = self.pending.trim_start();
        if !rest.is_empty() {
            let line = rest.to_owned();
            self.pending.clear();
            return Ok(Some(line));
        }
        match self.fill()? {
            true => Ok(Some(std::mem::take(&mut self.pending))),
            false => Ok(None),
        }
    }

    /// Returns `None` at end of input.
    pub fn next_token(&mut self) -> io::Result<Option<String>> {
        loop {
            let rest = self.pending.trim_start();
            if !rest.is_empty() {
                let end = rest.find(char::is_whitespace).unwrap_or_else(|| rest.len());
                let token = rest[..end].to_owned();
                self.pending = rest[end..].to_owned();
                return Ok(Some(token));
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }
}
