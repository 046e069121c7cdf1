use crate::translator::SqlWriter;

/// Clauses of one select level. Navigation joins are only known once every clause
/// was translated, so the text is assembled once, on first `converge`, and cached.
#[derive(Debug, Clone, Default)]
pub struct SelectFragments {
    pub head: String,
    pub from: String,
    pub joins: Vec<String>,
    pub filter: Option<String>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Option<String>,
    pub page_suffix: Option<String>,
    navigation_joins: Vec<String>,
    pad: String,
    text: Option<String>,
}

impl SelectFragments {
    pub fn new(pad: String) -> Self {
        Self { pad, ..Self::default() }
    }

    /// Ignored once converged.
    pub fn set_navigation_joins(&mut self, joins: Vec<String>) {
        if self.text.is_none() {
            self.navigation_joins = joins;
        }
    }

    pub fn is_converged(&self) -> bool {
        self.text.is_some()
    }

    pub fn converge(&mut self) -> &str {
        if self.text.is_none() {
            let mut w = SqlWriter::new(self.pad.clone());
            w.line(&self.head);
            w.line(&format!("FROM {}", self.from));
            w.lines(&self.joins);
            w.lines(&self.navigation_joins);
            for clause in [&self.filter, &self.group_by, &self.having, &self.order_by, &self.page_suffix].into_iter().flatten() {
                w.line(clause);
            }
            self.text = Some(w.finish());
        }
        self.text.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_once() {
        let mut f = SelectFragments::new(String::new());
        f.head = "SELECT t0.[Id]".into();
        f.from = "[Orders] t0".into();
        f.filter = Some("WHERE t0.[Id] > @p0".into());
        f.set_navigation_joins(vec!["LEFT JOIN [Items] t1 ON t0.[Id] = t1.[OrderId]".into()]);
        let first = f.converge().to_string();
        assert_eq!(first, "SELECT t0.[Id]\nFROM [Orders] t0\nLEFT JOIN [Items] t1 ON t0.[Id] = t1.[OrderId]\nWHERE t0.[Id] > @p0");

        f.set_navigation_joins(Vec::new());
        f.order_by = Some("ORDER BY t0.[Id]".into());
        assert!(f.is_converged());
        assert_eq!(f.converge(), first);
    }
}
