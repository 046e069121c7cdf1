use std::collections::HashMap;

use crate::{dialect::Intrinsic, error::TranslationError};

pub type FunctionRenderer = fn(&[String]) -> String;

#[derive(Clone, Copy)]
pub enum FunctionTemplate {
    /// `{n}` is replaced by the n-th rendered argument (receiver is `{0}`).
    Pattern(&'static str),
    Render(FunctionRenderer),
}

impl FunctionTemplate {
    pub fn apply(&self, args: &[String]) -> String {
        match self {
            FunctionTemplate::Pattern(pattern) => fill(pattern, args),
            FunctionTemplate::Render(render) => render(args),
        }
    }
}

/// Single pass so argument text containing `{n}` is never substituted twice.
fn fill(pattern: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(pattern.len() + args.iter().map(String::len).sum::<usize>());
    let mut chars = pattern.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '{' {
            let rest = &pattern[i + 1..];
            if let Some(end) = rest.find('}') {
                if let Ok(n) = rest[..end].parse::<usize>() {
                    out.push_str(args.get(n).map(String::as_str).unwrap_or(""));
                    for _ in 0..=end {
                        chars.next();
                    }
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Per-dialect strategy map from intrinsic tag to SQL template, built once with the dialect.
#[derive(Clone, Default)]
pub struct FunctionTable {
    by_tag: HashMap<Intrinsic, FunctionTemplate>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self { by_tag: HashMap::new() }
    }

    pub fn register(&mut self, tag: Intrinsic, template: FunctionTemplate) {
        self.by_tag.insert(tag, template);
    }

    pub fn with(mut self, entries: Vec<(Intrinsic, FunctionTemplate)>) -> Self {
        for (tag, template) in entries {
            self.register(tag, template);
        }
        self
    }

    pub fn get(&self, tag: Intrinsic) -> Option<&FunctionTemplate> {
        self.by_tag.get(&tag)
    }

    pub fn render(&self, tag: Intrinsic, args: &[String]) -> Result<String, TranslationError> {
        let template = self.get(tag).ok_or_else(|| TranslationError::UnsupportedMethod(format!("{:?}", tag)))?;
        Ok(template.apply(args))
    }

    /// Entries whose SQL is the same in every supported dialect.
    pub fn common() -> Self {
        use FunctionTemplate::Pattern;
        use Intrinsic::*;
        Self::new().with(vec![
            (ToUpper, Pattern("UPPER({0})")),
            (ToLower, Pattern("LOWER({0})")),
            (TrimStart, Pattern("LTRIM({0})")),
            (TrimEnd, Pattern("RTRIM({0})")),
            (Trim, Pattern("TRIM({0})")),
            (Replace, Pattern("REPLACE({0}, {1}, {2})")),
            (Abs, Pattern("ABS({0})")),
            (Floor, Pattern("FLOOR({0})")),
            (Power, Pattern("POWER({0}, {1})")),
            (Modulo, Pattern("({0} % {1})")),
            (Coalesce, Pattern("COALESCE({0}, {1})")),
            (Round, FunctionTemplate::Render(render_round)),
            (IsNullOrEmpty, Pattern("({0} IS NULL OR {0} = '')")),
        ])
    }
}

fn render_round(args: &[String]) -> String {
    match args {
        [value] => format!("ROUND({}, 0)", value),
        [value, digits, ..] => format!("ROUND({}, {})", value, digits),
        [] => String::new(),
    }
}

/// `a || b || c`, parenthesised.
pub fn pipe_concat(args: &[String]) -> String {
    format!("({})", args.join(" || "))
}
