//! Line-buffered source writers.

/// Accumulates generated source text, one line at a time, tracking nesting.
pub trait LineBuilder {
  fn line(&mut self, text: &str);

  /// Emit `header` and indent everything up to the matching [`block_end`].
  ///
  /// [`block_end`]: LineBuilder::block_end
  fn block_start(&mut self, header: &str);

  /// Close the innermost block; a non-empty `footer` is emitted at the outer level.
  fn block_end(&mut self, footer: &str);

  /// Take the text written so far, leaving the builder empty.
  fn finish(&mut self) -> String;
}

/// Python source: four-space indentation, no closing delimiters.
#[derive(Debug, Default)]
pub struct PythonWriter {
  text: String,
  indent: usize,
}

impl PythonWriter {
  const INDENT: &'static str = "    ";

  pub fn new() -> Self {
    Self::default()
  }

  pub fn indent(&self) -> usize {
    self.indent
  }
}

impl LineBuilder for PythonWriter {
  fn line(&mut self, text: &str) {
    if !text.is_empty() {
      for _ in 0..self.indent {
        self.text.push_str(Self::INDENT);
      }
      self.text.push_str(text);
    }
    self.text.push('\n');
  }

  fn block_start(&mut self, header: &str) {
    self.line(header);
    self.indent += 1;
  }

  fn block_end(&mut self, footer: &str) {
    self.indent = self.indent.saturating_sub(1);
    if !footer.is_empty() {
      self.line(footer);
    }
  }

  fn finish(&mut self) -> String {
    self.indent = 0;
    std::mem::take(&mut self.text)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn nested_blocks_indent_by_four() {
    let mut w = PythonWriter::new();
    w.block_start("def f():");
    w.block_start("if x:");
    w.line("y = 1");
    w.block_end("");
    w.line("return y");
    w.block_end("");
    assert_eq!(w.finish(), "def f():\n    if x:\n        y = 1\n    return y\n");
  }

  #[test]
  fn empty_line_has_no_indent() {
    let mut w = PythonWriter::new();
    w.block_start("def f():");
    w.line("");
    w.line("pass");
    w.block_end("");
    assert_eq!(w.finish(), "def f():\n\n    pass\n");
  }

  #[test]
  fn footer_is_written_at_outer_level() {
    let mut w = PythonWriter::new();
    w.block_start("try:");
    w.line("pass");
    w.block_end("finally: pass");
    assert_eq!(w.finish(), "try:\n    pass\nfinally: pass\n");
    assert_eq!(w.indent(), 0);
  }
}
