use std::io::{self, BufRead, Write};

pub struct ShellPrompt {
    text: String,
    visible: bool,
}

impl ShellPrompt {
    /// `visible` is false when input does not come from a terminal.
    pub fn new(text: impl Into<String>, visible: bool) -> Self {
        ShellPrompt {
            text: text.into(),
            visible,
        }
    }

    pub fn show_prompt(&self) -> io::Result<()> {
        if self.visible {
            let mut out = io::stdout().lock();
            out.write_all(self.text.as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }

    /// Reads one line without its terminator. `None` at end of input.
    /// Bytes are returned undecoded so a bad line can be rejected alone.
    pub fn read_line(&self, input: &mut impl BufRead) -> io::Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        if input.read_until(b'\n', &mut buf)? == 0 {
            // EOF (e.g., Ctrl-D)
            if self.visible {
                println!();
            }
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(buf))
    }
}
