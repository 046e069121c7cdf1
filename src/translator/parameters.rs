use crate::{dialect::Dialect, metadata::{ColumnMeta, DbType}, value::DbValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: DbValue,
    pub db_type: Option<DbType>,
    pub size: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub direction: ParameterDirection,
}

/// Append-only parameter list shared by every nesting level of one statement.
/// Names follow visitation order.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    items: Vec<Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds an input parameter typed after the column it is compared with or assigned to.
    pub fn push(&mut self, dialect: &dyn Dialect, value: DbValue, hint: Option<&ColumnMeta>) -> String {
        let name = dialect.parameter_name(self.items.len());
        self.items.push(Parameter {
            name: name.clone(),
            value,
            db_type: hint.map(|c| c.db_type),
            size: hint.and_then(|c| c.size),
            precision: hint.and_then(|c| c.precision),
            scale: hint.and_then(|c| c.scale),
            direction: ParameterDirection::Input,
        });
        name
    }

    pub fn push_output(&mut self, name: &str, db_type: DbType) {
        self.items.push(Parameter {
            name: name.to_string(),
            value: DbValue::Null,
            db_type: Some(db_type),
            size: None,
            precision: None,
            scale: None,
            direction: ParameterDirection::Output,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Parameter> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqlServer;

    #[test]
    fn names_follow_order_and_carry_hints() {
        let d = SqlServer::new();
        let mut params = Parameters::new();
        let col = ColumnMeta::new("Name", DbType::String).size(32);
        assert_eq!(params.push(&d, DbValue::from("x"), Some(&col)), "@p0");
        assert_eq!(params.push(&d, DbValue::from(1), None), "@p1");
        let items = params.into_vec();
        assert_eq!(items[0].db_type, Some(DbType::String));
        assert_eq!(items[0].size, Some(32));
        assert_eq!(items[1].db_type, None);
    }
}
