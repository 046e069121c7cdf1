use crate::{error::OrmError, query::Expr, translator::ExpressionTranslator};

pub struct WhereTranslator;

impl WhereTranslator {
    pub fn translate(et: &mut ExpressionTranslator, filter: Option<&Expr>) -> Result<Option<String>, OrmError> {
        match filter {
            Some(predicate) => Ok(Some(format!("WHERE {}", et.translate_predicate(predicate)?))),
            None => Ok(None),
        }
    }
}
