//! `#` comment and label lines.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    /// Text after the `#`, untrimmed.
    pub text: String,
}

impl CommentLine {
    pub fn parse(line: &str) -> Option<Self> {
        let text = line.trim().strip_prefix('#')?;
        Some(CommentLine {
            text: text.to_string(),
        })
    }

    /// `#Name` is a label; `# note` and `##` are plain comments.
    pub fn is_label(&self) -> bool {
        self.text
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && c != '#')
    }

    pub fn label(&self) -> Option<&str> {
        self.is_label().then(|| self.text.trim_end())
    }
}

/// Whether `line` is the label `#name`, ignoring surrounding whitespace
/// and the whitespace between `#` and the name.
pub fn matches_label(line: &str, name: &str) -> bool {
    line.trim()
        .strip_prefix('#')
        .is_some_and(|rest| rest.trim() == name.trim())
}
