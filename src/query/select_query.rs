use crate::{
    metadata::MetadataProvider,
    query::{AggregateCall, Binding, BindingValue, Expr, GroupBy, Include, JoinClause, JoinKind, MemberPath, OrderBy, Projection}
};

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(String),
    Subquery(Box<SelectQuery>),
}

/// Caller-built select. Frozen once handed to the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub from: Source,
    pub label: String,
    pub joins: Vec<JoinClause>,
    pub filter: Option<Expr>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub skip: u64,
    pub take: u64,
    pub distinct: bool,
    /// Existence check: the statement answers 1 or 0.
    pub any: bool,
    pub aggregate: Option<AggregateCall>,
    pub unions: Vec<SelectQuery>,
    pub select: Option<Projection>,
    pub includes: Vec<Include>,
}

impl SelectQuery {
    pub fn from(entity: &str, label: &str) -> Self {
        Self::from_source(Source::Table(entity.to_string()), label)
    }

    pub fn from_subquery(query: SelectQuery, label: &str) -> Self {
        Self::from_source(Source::Subquery(Box::new(query)), label)
    }

    fn from_source(from: Source, label: &str) -> Self {
        Self {
            from,
            label: label.to_string(),
            joins: Vec::new(),
            filter: None,
            group_by: None,
            having: None,
            order_by: Vec::new(),
            skip: 0,
            take: 0,
            distinct: false,
            any: false,
            aggregate: None,
            unions: Vec::new(),
            select: None,
            includes: Vec::new(),
        }
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    pub fn inner_join(self, entity: &str, label: &str, outer: Expr, inner: Expr) -> Self {
        self.join(JoinClause::new(JoinKind::Inner, entity, label, vec![(outer, inner)]))
    }

    pub fn left_join(self, entity: &str, label: &str, outer: Expr, inner: Expr) -> Self {
        self.join(JoinClause::new(JoinKind::Left, entity, label, vec![(outer, inner)]))
    }

    /// Successive filters are AND-ed.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn having(mut self, predicate: Expr) -> Self {
        self.having = Some(predicate);
        self
    }

    pub fn order_by(mut self, expr: Expr) -> Self {
        self.order_by.push(OrderBy::asc(expr));
        self
    }

    pub fn order_by_desc(mut self, expr: Expr) -> Self {
        self.order_by.push(OrderBy::desc(expr));
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = n;
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.take = n;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn any(mut self) -> Self {
        self.any = true;
        self
    }

    pub fn count(self) -> Self {
        self.aggregate(AggregateCall::count())
    }

    pub fn aggregate(mut self, call: AggregateCall) -> Self {
        self.aggregate = Some(call);
        self
    }

    pub fn union(mut self, branch: SelectQuery) -> Self {
        self.unions.push(branch);
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.select = Some(projection);
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.includes.push(include);
        self
    }

    pub fn is_paged(&self) -> bool {
        self.skip > 0 || self.take > 0
    }

    /// Entity whose rows this query yields before projection.
    pub fn root_entity(&self) -> Option<&str> {
        match &self.from {
            Source::Table(entity) => Some(entity),
            Source::Subquery(inner) => inner.root_entity(),
        }
    }

    /// Whether any included or projected navigation is a sequence.
    pub fn has_many(&self, metadata: &dyn MetadataProvider) -> bool {
        let includes = self.includes.iter().any(|inc| self.path_has_many(&inc.path, metadata));
        let projected = match &self.select {
            Some(Projection::Object(bindings)) => self.bindings_have_many(bindings, metadata),
            Some(Projection::Scalar(Expr::Member(path))) => self.path_has_many(path, metadata),
            _ => false,
        };
        includes || projected
    }

    fn bindings_have_many(&self, bindings: &[Binding], metadata: &dyn MetadataProvider) -> bool {
        bindings.iter().any(|b| match &b.value {
            BindingValue::Navigation(path) => self.path_has_many(path, metadata),
            BindingValue::Object(inner) => self.bindings_have_many(inner, metadata),
            _ => false,
        })
    }

    fn path_has_many(&self, path: &MemberPath, metadata: &dyn MetadataProvider) -> bool {
        if path.source != self.label {
            return false;
        }
        let mut entity = match self.root_entity().and_then(|e| metadata.entity(e)) {
            Some(e) => e,
            None => return false,
        };
        for member in &path.members {
            let Some(nav) = entity.get_navigation(member) else { return false };
            if nav.many {
                return true;
            }
            entity = match metadata.entity(&nav.target) {
                Some(e) => e,
                None => return false,
            };
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnMeta, DbType, EntityMeta, ForeignKey, MetadataRegistry, NavigationMeta};

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(EntityMeta::new("Order", "Orders")
                .column(ColumnMeta::identity("Id"))
                .column(ColumnMeta::new("ClientId", DbType::Int))
                .navigation(NavigationMeta::one("Client", "Client", ForeignKey::single("ClientId", "Id")))
                .navigation(NavigationMeta::many("Items", "Item", ForeignKey::single("Id", "OrderId"))))
            .unwrap()
            .with(EntityMeta::new("Client", "Clients").column(ColumnMeta::identity("Id")))
            .unwrap()
            .with(EntityMeta::new("Item", "Items").column(ColumnMeta::identity("Id")).column(ColumnMeta::new("OrderId", DbType::Int)))
            .unwrap()
    }

    #[test]
    fn filters_accumulate_with_and() {
        let q = SelectQuery::from("Order", "a")
            .filter(Expr::col("a", "Id").gt(Expr::val(1)))
            .filter(Expr::col("a", "Id").lt(Expr::val(9)));
        assert!(matches!(q.filter, Some(Expr::Binary { op: crate::query::BinaryOp::And, .. })));
    }

    #[test]
    fn has_many_follows_includes_and_projection() {
        let reg = registry();
        assert!(!SelectQuery::from("Order", "a").include(Include::new("a.Client")).has_many(&reg));
        assert!(SelectQuery::from("Order", "a").include(Include::new("a.Items")).has_many(&reg));
        let projected = SelectQuery::from("Order", "a")
            .select(Projection::Object(vec![Binding::expr("Id", Expr::col("a", "Id")), Binding::navigation("Items", "a.Items")]));
        assert!(projected.has_many(&reg));
    }

    #[test]
    fn root_entity_looks_through_subqueries() {
        let q = SelectQuery::from_subquery(SelectQuery::from("Order", "a").take(3), "a");
        assert_eq!(q.root_entity(), Some("Order"));
    }
}
