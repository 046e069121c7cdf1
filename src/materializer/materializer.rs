use std::{any::type_name, marker::PhantomData, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    compiler::Command,
    error::MaterializationError,
    materializer::{EntityStream, PlanCache, RowCursor, ValueConverter},
    metadata::{DbType, MetadataProvider},
};

/// Target name used for plans of commands with no root entity.
const OBJECT_TARGET: &str = "object";

/// Turns the rows of an executed command into entity graphs, scalars or typed values.
pub struct Materializer<'m> {
    metadata: &'m dyn MetadataProvider,
    cache: Arc<PlanCache>,
}

impl<'m> Materializer<'m> {
    pub fn new(metadata: &'m dyn MetadataProvider) -> Self {
        Self { metadata, cache: Arc::new(PlanCache::new()) }
    }

    /// Shares plans with other materializers.
    pub fn with_cache(metadata: &'m dyn MetadataProvider, cache: Arc<PlanCache>) -> Self {
        Self { metadata, cache }
    }

    pub fn cache(&self) -> &Arc<PlanCache> {
        &self.cache
    }

    /// Lazily yields one JSON object per root entity of `command`'s result.
    pub fn entities<C: RowCursor>(&self, command: &Command, cursor: C) -> Result<EntityStream<C>, MaterializationError> {
        let target = command.entity().unwrap_or(OBJECT_TARGET);
        self.stream(command, target, cursor)
    }

    /// Like [`Materializer::entities`], deserializing every root into `T`.
    pub fn typed<T: DeserializeOwned, C: RowCursor>(&self, command: &Command, cursor: C) -> Result<Typed<T, C>, MaterializationError> {
        let inner = self.stream(command, type_name::<T>(), cursor)?;
        Ok(Typed { inner, marker: PhantomData })
    }

    /// First column of every row.
    pub fn scalars<C: RowCursor>(&self, cursor: C, db_type: Option<DbType>) -> Scalars<C> {
        Scalars { cursor, db_type, done: false }
    }

    /// First column of the first row; `None` for an empty result.
    pub fn scalar<C: RowCursor>(&self, cursor: C, db_type: Option<DbType>) -> Result<Option<Value>, MaterializationError> {
        self.scalars(cursor, db_type).next().transpose()
    }

    fn stream<C: RowCursor>(&self, command: &Command, target: &str, cursor: C) -> Result<EntityStream<C>, MaterializationError> {
        let plan = self.cache.get_or_build(command, target, cursor.field_count(), self.metadata)?;
        debug!(target: "ormql::materializer", target_type = target, has_many = plan.has_many, "materializing rows");
        Ok(EntityStream::new(cursor, plan))
    }
}

pub struct Typed<T, C: RowCursor> {
    inner: EntityStream<C>,
    marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned, C: RowCursor> Iterator for Typed<T, C> {
    type Item = Result<T, MaterializationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.inner.next()? {
            Ok(value) => value,
            Err(err) => return Some(Err(err)),
        };
        Some(serde_json::from_value(value).map_err(|e| MaterializationError::Deserialize {
            target: type_name::<T>().to_string(),
            message: e.to_string(),
        }))
    }
}

pub struct Scalars<C: RowCursor> {
    cursor: C,
    db_type: Option<DbType>,
    done: bool,
}

impl<C: RowCursor> Scalars<C> {
    fn step(&mut self) -> Result<Option<Value>, MaterializationError> {
        if !self.cursor.move_next()? {
            return Ok(None);
        }
        let column = self.cursor.name_at(0).unwrap_or("").to_string();
        if self.cursor.field_count() == 0 {
            return Err(MaterializationError::ColumnOutOfRange { index: 0, field_count: 0 });
        }
        if self.cursor.is_null(0) {
            return Ok(Some(Value::Null));
        }
        ValueConverter::convert(self.cursor.get_value(0)?, self.db_type, &column).map(Some)
    }
}

impl<C: RowCursor> Iterator for Scalars<C> {
    type Item = Result<Value, MaterializationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.step().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::{
        compiler::QueryCompiler,
        dialect::SqlServer,
        metadata::{ColumnMeta, EntityMeta, ForeignKey, MetadataRegistry, NavigationMeta},
        materializer::MemoryCursor,
        query::{AggregateCall, Include, SelectQuery},
    };

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("No", DbType::String))
                .navigation(NavigationMeta::many("Items", "Item", ForeignKey::single("Id", "OrderId"))))
            .unwrap()
            .with(EntityMeta::new("Item", "Items")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("OrderId", DbType::Int))
                .column(ColumnMeta::new("Qty", DbType::Int)))
            .unwrap()
    }

    fn command(reg: &MetadataRegistry) -> Command {
        QueryCompiler::new(Arc::new(SqlServer::new()), reg)
            .compile_select(&SelectQuery::from("Order", "a").include(Include::new("a.Items")))
            .unwrap()
    }

    // Id, No, split, Id1, OrderId, Qty
    fn rows() -> Vec<Value> {
        vec![
            json!([1, "A", 1, 10, 1, 2]),
            json!([1, "A", 1, 11, 1, 3]),
            json!([2, "B", null, null, null, null]),
        ]
    }

    fn names() -> Vec<&'static str> {
        vec!["Id", "No", "NavigationSplitOn__", "Id1", "OrderId", "Qty"]
    }

    #[test]
    fn entities_follow_the_compiled_shape() {
        let reg = registry();
        let command = command(&reg);
        let materializer = Materializer::new(&reg);
        let cursor = MemoryCursor::from_json(names(), &rows()).unwrap();
        let orders: Vec<Value> = materializer.entities(&command, cursor).unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(orders, vec![
            json!({ "Id": 1, "No": "A", "Items": [
                { "Id": 10, "OrderId": 1, "Qty": 2 },
                { "Id": 11, "OrderId": 1, "Qty": 3 }
            ] }),
            json!({ "Id": 2, "No": "B", "Items": [] }),
        ]);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Order {
        id: i64,
        no: String,
        items: Vec<Item>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Item {
        id: i64,
        qty: i64,
    }

    #[test]
    fn typed_results_reuse_cached_plans() {
        let reg = registry();
        let command = command(&reg);
        let materializer = Materializer::new(&reg);

        for _ in 0..2 {
            let cursor = MemoryCursor::from_json(names(), &rows()).unwrap();
            let orders: Vec<Order> = materializer.typed(&command, cursor).unwrap().collect::<Result<_, _>>().unwrap();
            assert_eq!(orders.len(), 2);
            assert_eq!(orders[0].items, vec![Item { id: 10, qty: 2 }, Item { id: 11, qty: 3 }]);
            assert_eq!(orders[1].no, "B");
        }
        assert_eq!(materializer.cache().len(), 1);
    }

    #[test]
    fn typed_mismatch_is_a_deserialize_error() {
        let reg = registry();
        let command = command(&reg);
        let materializer = Materializer::new(&reg);
        let cursor = MemoryCursor::from_json(names(), &rows()).unwrap();
        let first = materializer.typed::<Vec<String>, _>(&command, cursor).unwrap().next().unwrap();
        assert!(matches!(first, Err(MaterializationError::Deserialize { .. })));
    }

    #[test]
    fn scalar_reads_the_first_column() {
        let reg = registry();
        let command = QueryCompiler::new(Arc::new(SqlServer::new()), &reg)
            .compile_select(&SelectQuery::from("Order", "a").aggregate(AggregateCall::count()))
            .unwrap();
        assert_eq!(command.columns().len(), 1);

        let materializer = Materializer::new(&reg);
        let cursor = MemoryCursor::from_json(["Count"], &[json!(["3"])]).unwrap();
        assert_eq!(materializer.scalar(cursor, Some(DbType::Int)).unwrap(), Some(json!(3)));

        let empty = MemoryCursor::from_json(["Count"], &[]).unwrap();
        assert_eq!(materializer.scalar(empty, Some(DbType::Int)).unwrap(), None);

        let cursor = MemoryCursor::from_json(["No"], &[json!(["a"]), json!([null]), json!(["c"])]).unwrap();
        let values: Vec<Value> = materializer.scalars(cursor, None).collect::<Result<_, _>>().unwrap();
        assert_eq!(values, vec![json!("a"), Value::Null, json!("c")]);
    }
}
