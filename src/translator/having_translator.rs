use crate::{error::{OrmError, TranslationError}, query::Expr, translator::ExpressionTranslator};

pub struct HavingTranslator;

impl HavingTranslator {
    /// `grouped` tells whether the statement has a GROUP BY; HAVING without one is rejected.
    pub fn translate(et: &mut ExpressionTranslator, having: Option<&Expr>, grouped: bool) -> Result<Option<String>, OrmError> {
        let Some(predicate) = having else { return Ok(None) };
        if !grouped {
            return Err(TranslationError::Unsupported("HAVING requires a GROUP BY".into()).into());
        }
        Ok(Some(format!("HAVING {}", et.translate_predicate(predicate)?)))
    }
}
