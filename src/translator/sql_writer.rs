/// Line-oriented SQL builder; every line of a statement is indented to its nesting depth.
#[derive(Debug, Clone)]
pub struct SqlWriter {
    buf: String,
    pad: String,
}

impl SqlWriter {
    pub fn new(pad: String) -> Self {
        Self { buf: String::new(), pad }
    }

    pub fn line(&mut self, text: &str) -> &mut Self {
        if !self.buf.is_empty() {
            self.buf.push('\n');
        }
        self.buf.push_str(&self.pad);
        self.buf.push_str(text);
        self
    }

    pub fn lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for l in lines {
            self.line(l.as_ref());
        }
        self
    }

    /// Appends to the current line.
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
