//! Numbered G-code writer used by the simulated post-processor.

/// Block numbers advance by this much per numbered line.
const BLOCK_STEP: u32 = 10;

/// Builds one NC program as text, numbering motion blocks `N10`, `N20`, ...
pub struct GcodeWriter {
    next_block: u32,
    program: String,
}

impl GcodeWriter {
    pub fn new() -> Self {
        Self {
            next_block: BLOCK_STEP,
            program: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.program
    }

    /// Finish writing and hand back the program text.
    pub fn take_output(self) -> String {
        self.program
    }

    /// Append a numbered block.
    pub fn write_line(&mut self, block: &str) {
        let number = self.next_block;
        self.next_block += BLOCK_STEP;
        self.write_raw(&format!("N{} {}", number, block));
    }

    /// Append a line as-is.
    pub fn write_raw(&mut self, line: &str) {
        self.program.push_str(line);
        self.program.push('\n');
    }

    /// Write a comment line. Parentheses are stripped so the comment stays closed.
    pub fn write_comment(&mut self, comment: &str) {
        let clean: String = comment.chars().filter(|c| *c != '(' && *c != ')').collect();
        self.write_raw(&format!("({})", clean.to_uppercase()));
    }

    /// Write a program tape marker.
    pub fn write_terminator(&mut self) {
        self.write_raw("%");
    }

    // === Program structure ===

    /// Program header: tape marker, program number and part comment.
    pub fn begin_program(&mut self, number: u32, part_name: &str) {
        self.write_terminator();
        self.write_raw(&format!("O{:04}", number));
        self.write_comment(part_name);
    }

    /// Start of one operation's block.
    pub fn begin_operation(&mut self, index: usize, name: &str) {
        self.write_comment(&format!("OP{} {}", index + 1, name));
        self.write_line("G90 G54");
    }

    /// End of one operation's block: retract and stop spindle.
    pub fn end_operation(&mut self) {
        self.write_line("G00 Z50");
        self.write_line("M05");
    }

    /// Program end and rewind.
    pub fn end_program(&mut self) {
        self.write_line("M30");
        self.write_terminator();
    }
}

impl Default for GcodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_are_numbered_in_steps() {
        let mut writer = GcodeWriter::new();
        writer.write_line("G21");
        writer.write_raw("(NOTE)");
        writer.write_line("G90");
        assert_eq!(writer.output(), "N10 G21\n(NOTE)\nN20 G90\n");
    }

    #[test]
    fn test_comment_is_sanitized() {
        let mut writer = GcodeWriter::new();
        writer.write_comment("rough (pass 1)");
        assert_eq!(writer.take_output(), "(ROUGH PASS 1)\n");
    }

    #[test]
    fn test_program_layout() {
        let mut writer = GcodeWriter::new();
        writer.begin_program(1, "bracket");
        writer.begin_operation(0, "F-profile");
        writer.end_operation();
        writer.end_program();
        insta::assert_snapshot!(writer.output(), @r"
        %
        O0001
        (BRACKET)
        (OP1 F-PROFILE)
        N10 G90 G54
        N20 G00 Z50
        N30 M05
        N40 M30
        %
        ");
    }
}
