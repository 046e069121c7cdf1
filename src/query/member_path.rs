use std::fmt;

/// `label.Member.Member`: a source label followed by member names, navigations first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPath {
    pub source: String,
    pub members: Vec<String>,
}

impl MemberPath {
    pub fn new(source: &str, members: &str) -> Self {
        Self {
            source: source.to_string(),
            members: members.split('.').filter(|m| !m.is_empty()).map(str::to_string).collect(),
        }
    }

    /// Parses `a.Client.Name`; the first segment is the source label.
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((source, rest)) => Self::new(source, rest),
            None => Self { source: text.to_string(), members: Vec::new() },
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.members.last().map(String::as_str)
    }

    /// Key of the first `depth` members, rooted at the source label.
    pub fn key_at(&self, depth: usize) -> String {
        let mut key = self.source.clone();
        for m in self.members.iter().take(depth) {
            key.push('.');
            key.push_str(m);
        }
        key
    }

    /// Members joined by `.` without the source label.
    pub fn relative(&self) -> String {
        self.members.join(".")
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_at(self.members.len()))
    }
}
