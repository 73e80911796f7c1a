//! Fortran code emitter - generates Fortran source code strings
//!
//! A small indentation-aware buffer for building driver programs.

/// A buffer for building Fortran source code with consistent indentation
#[derive(Debug)]
pub struct FortranEmitter {
    buffer: String,
    indent_level: usize,
    indent_str: &'static str,
}

impl Default for FortranEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl FortranEmitter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            indent_str: "    ",
        }
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Get current buffer as string slice
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a `!` comment line
    pub fn comment(&mut self, text: &str) {
        self.line(&format!("! {text}"));
    }

    /// Write a blank line
    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(self.indent_str);
        }
    }

    /// Increase indent level
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indent level
    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Write a `program` unit with an indented body
    pub fn program<F>(&mut self, name: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(&format!("program {name}"));
        self.indent();
        f(self);
        self.dedent();
        self.line(&format!("end program {name}"));
    }

    /// Write a `use` statement, optionally restricted with `only:`
    pub fn use_module(&mut self, module: &str, intrinsic: bool, only: &[&str]) {
        let head = if intrinsic {
            format!("use, intrinsic :: {module}")
        } else {
            format!("use {module}")
        };
        if only.is_empty() {
            self.line(&head);
        } else {
            self.line(&format!("{head}, only: {}", only.join(", ")));
        }
    }

    /// Write a `call name()` statement
    pub fn call(&mut self, subroutine: &str) {
        self.line(&format!("call {subroutine}()"));
    }

    /// Write a literal line to standard output (`write(*, '(a)') '...'`)
    pub fn write_text(&mut self, text: &str) {
        self.line(&format!("write(*, '(a)') {}", quote(text)));
    }
}

/// Quote text as a Fortran character literal.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
