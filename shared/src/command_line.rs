//! Directive lines such as `Read, 1A.tas, Start` or `Repeat 3`.

/// A line that starts with a letter, split into a name and arguments.
///
/// The separator is a comma when the line contains one and whitespace
/// otherwise. Arguments are trimmed; empty ones are kept so positional
/// arguments stay in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub args: Vec<String>,
    /// The trimmed source text.
    pub text: String,
}

impl CommandLine {
    pub fn parse(line: &str) -> Option<Self> {
        let text = line.trim();
        if !text.chars().next()?.is_ascii_alphabetic() {
            return None;
        }

        let mut parts: Vec<String> = if text.contains(',') {
            text.split(',').map(|part| part.trim().to_string()).collect()
        } else {
            text.split_whitespace().map(str::to_string).collect()
        };

        let name = parts.remove(0);
        if name.is_empty() {
            return None;
        }

        Some(CommandLine {
            name,
            args: parts,
            text: text.to_string(),
        })
    }

    /// Canonical `Name, arg1, arg2` form.
    pub fn canonical(&self) -> String {
        let mut out = self.name.clone();
        for arg in &self.args {
            out.push_str(", ");
            out.push_str(arg);
        }
        out
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
