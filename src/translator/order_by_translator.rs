use crate::{error::OrmError, query::OrderBy, translator::ExpressionTranslator};

pub struct OrderByTranslator;

impl OrderByTranslator {
    /// `extra` terms (already rendered, ascending) follow the caller's ordering; repeats are dropped.
    pub fn translate(et: &mut ExpressionTranslator, order_by: &[OrderBy], extra: &[String]) -> Result<Option<String>, OrmError> {
        let mut seen: Vec<String> = Vec::new();
        let mut terms = Vec::new();
        for term in order_by {
            let sql = et.translate(&term.expr)?;
            if seen.contains(&sql) {
                continue;
            }
            terms.push(if term.descending { format!("{} DESC", sql) } else { sql.clone() });
            seen.push(sql);
        }
        for sql in extra {
            if !seen.contains(sql) {
                terms.push(sql.clone());
                seen.push(sql.clone());
            }
        }
        Ok((!terms.is_empty()).then(|| format!("ORDER BY {}", terms.join(", "))))
    }
}
