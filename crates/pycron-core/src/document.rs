//! In-memory snapshot of the user's crontab.
//!
//! One document is fetched per operation, mutated in place, and discarded
//! after commit. Unrelated lines are carried as opaque bytes; matching is
//! whole-line equality except for the legacy interval rewrite.

use regex::Regex;

use crate::error::PycronError;

/// Ordered sequence of crontab lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrontabDocument {
    lines: Vec<String>,
}

impl CrontabDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a document from `crontab -l` output, dropping trailing blank
    /// lines but keeping interior ones verbatim.
    pub fn from_listing(text: &str) -> Self {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        Self { lines }
    }

    /// Render the full table text for installation, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Index of the first line equal to `line` verbatim.
    pub fn find_exact(&self, line: &str) -> Option<usize> {
        self.lines.iter().position(|l| l == line)
    }

    /// Index of the first line matching the anchored pattern.
    pub fn find_pattern(&self, pattern: &Regex) -> Option<usize> {
        self.lines.iter().position(|l| pattern.is_match(l))
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Remove every line equal to `line`; returns how many were removed.
    pub fn remove_exact(&mut self, line: &str) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| l != line);
        before - self.lines.len()
    }

    /// Replace the first line equal to `old` with `new`. Returns whether a
    /// replacement happened.
    pub fn replace_first(&mut self, old: &str, new: &str) -> bool {
        match self.find_exact(old) {
            Some(idx) => {
                self.lines[idx] = new.to_string();
                true
            }
            None => false,
        }
    }

    /// Legacy interval-only update: rewrite the step digits of the first
    /// line whose command tail is `<interpreter> <script>`, leaving the
    /// rest of the line untouched. Returns whether a line was rewritten.
    pub fn rewrite_interval(
        &mut self,
        interval: u32,
        interpreter: &str,
        script: &str,
    ) -> Result<bool, PycronError> {
        let pattern = interval_pattern(interpreter, script)?;
        let Some(idx) = self.find_pattern(&pattern) else {
            return Ok(false);
        };
        let replacement = format!("*/{interval}${{2}}");
        self.lines[idx] = pattern
            .replace(&self.lines[idx], replacement.as_str())
            .into_owned();
        Ok(true)
    }
}

/// Anchored pattern for the legacy interval-only update: step digits, the
/// four fixed wildcard fields, the interpreter token (optionally version
/// suffixed, e.g. `python3.11`), and the escaped script path.
pub fn interval_pattern(interpreter: &str, script: &str) -> Result<Regex, PycronError> {
    let pattern = format!(
        r"^\*/(\d+)((?:\s\*){{4}}\s+{}[0-9.]*\s+{})\s*$",
        regex::escape(interpreter),
        regex::escape(script),
    );
    Ok(Regex::new(&pattern)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = "*/5 * * * * /usr/bin/python3 /tmp/j.py";
    const UNRELATED: &str = "0 0 * * * /usr/bin/backup.sh";

    #[test]
    fn test_listing_round_trip() {
        let doc = CrontabDocument::from_listing("a\nb\n\n");
        assert_eq!(doc.lines(), &["a".to_string(), "b".to_string()]);
        assert_eq!(doc.render(), "a\nb\n");
    }

    #[test]
    fn test_interior_blank_lines_survive() {
        let doc = CrontabDocument::from_listing("a\n\nb\n");
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.render(), "a\n\nb\n");
    }

    #[test]
    fn test_find_exact_on_single_entry() {
        let doc = CrontabDocument::from_listing(&format!("{ENTRY}\n"));
        assert_eq!(doc.find_exact(ENTRY), Some(0));
        assert_eq!(doc.find_exact("*/6 * * * * other"), None);
    }

    #[test]
    fn test_remove_exact_removes_all_matches() {
        let mut doc =
            CrontabDocument::from_listing(&format!("{ENTRY}\n{UNRELATED}\n{ENTRY}\n"));
        assert_eq!(doc.remove_exact(ENTRY), 2);
        assert_eq!(doc.lines(), &[UNRELATED.to_string()]);
        assert_eq!(doc.remove_exact(ENTRY), 0);
    }

    #[test]
    fn test_replace_first_only() {
        let mut doc =
            CrontabDocument::from_listing(&format!("{UNRELATED}\n{ENTRY}\n{ENTRY}\n"));
        let new = "*/30 * * * * /usr/bin/python3 /tmp/j.py";
        assert!(doc.replace_first(ENTRY, new));
        assert_eq!(
            doc.lines(),
            &[UNRELATED.to_string(), new.to_string(), ENTRY.to_string()]
        );
        assert!(!doc.replace_first("*/9 * * * * missing", new));
    }

    #[test]
    fn test_rewrite_interval_first_match() {
        let mut doc =
            CrontabDocument::from_listing(&format!("{UNRELATED}\n{ENTRY}\n{ENTRY}\n"));
        let rewritten = doc
            .rewrite_interval(45, "/usr/bin/python3", "/tmp/j.py")
            .unwrap();
        assert!(rewritten);
        assert_eq!(doc.lines()[0], UNRELATED);
        assert_eq!(doc.lines()[1], "*/45 * * * * /usr/bin/python3 /tmp/j.py");
        // Second occurrence untouched: first match only.
        assert_eq!(doc.lines()[2], ENTRY);
    }

    #[test]
    fn test_rewrite_interval_matches_versioned_interpreter() {
        let mut doc = CrontabDocument::from_listing(
            "*/5 * * * * /usr/bin/python3.11 /tmp/j.py\n",
        );
        let rewritten = doc
            .rewrite_interval(10, "/usr/bin/python", "/tmp/j.py")
            .unwrap();
        assert!(rewritten);
        assert_eq!(
            doc.lines()[0],
            "*/10 * * * * /usr/bin/python3.11 /tmp/j.py"
        );
    }

    #[test]
    fn test_rewrite_interval_no_match() {
        let mut doc = CrontabDocument::from_listing(&format!("{UNRELATED}\n"));
        let rewritten = doc
            .rewrite_interval(45, "/usr/bin/python3", "/tmp/j.py")
            .unwrap();
        assert!(!rewritten);
        assert_eq!(doc.lines(), &[UNRELATED.to_string()]);
    }

    #[test]
    fn test_rewrite_does_not_cross_regex_metacharacters() {
        // A script path containing regex metacharacters must match literally.
        let mut doc = CrontabDocument::from_listing(
            "*/5 * * * * /usr/bin/python3 /tmp/j+x(1).py\n",
        );
        let rewritten = doc
            .rewrite_interval(7, "/usr/bin/python3", "/tmp/j+x(1).py")
            .unwrap();
        assert!(rewritten);
        assert_eq!(doc.lines()[0], "*/7 * * * * /usr/bin/python3 /tmp/j+x(1).py");
    }
}
