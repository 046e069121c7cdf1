use crate::{error::OrmError, query::GroupBy, translator::ExpressionTranslator};

pub struct GroupByTranslator;

impl GroupByTranslator {
    pub fn translate(et: &mut ExpressionTranslator, group_by: Option<&GroupBy>) -> Result<Option<String>, OrmError> {
        let Some(group_by) = group_by else { return Ok(None) };
        let mut keys = Vec::with_capacity(group_by.keys.len());
        for (_, expr) in &group_by.keys {
            let sql = et.translate(expr)?;
            if !keys.contains(&sql) {
                keys.push(sql);
            }
        }
        Ok((!keys.is_empty()).then(|| format!("GROUP BY {}", keys.join(", "))))
    }
}
