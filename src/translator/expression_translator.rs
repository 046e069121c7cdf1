use crate::{
    compiler::SelectCompiler,
    dialect::Intrinsic,
    error::{OrmError, TranslationError},
    metadata::{ColumnMeta, NavigationMeta},
    query::{AggregateCall, AggregateKind, BinaryOp, Expr, GroupBy, MemberPath, SelectQuery, UnaryOp},
    translator::{AliasScope, ConstantFolder, NavigationResolver, TranslateContext},
    value::DbValue,
};

/// What a member path points at once its navigations are joined.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMember {
    Column { sql: String, column: Option<ColumnMeta> },
    Entity {
        /// Path key, e.g. `a` or `a.Client`.
        key: String,
        alias: String,
        entity: Option<String>,
        derived_columns: Option<Vec<String>>,
        /// Last navigation walked, `None` for a source label.
        navigation: Option<NavigationMeta>,
    },
}

/// Walks expression trees of one statement level into SQL fragments.
pub struct ExpressionTranslator<'t, 'a> {
    pub ctx: &'t mut TranslateContext<'a>,
    pub scope: &'t mut AliasScope,
    pub navigations: &'t mut NavigationResolver,
    group_by: Option<&'t GroupBy>,
    allow_navigation: bool,
    /// Columns behind a to-many navigation are readable only inside includes.
    allow_sequence_members: bool,
    depth: usize,
}

impl<'t, 'a> ExpressionTranslator<'t, 'a> {
    pub fn new(
        ctx: &'t mut TranslateContext<'a>,
        scope: &'t mut AliasScope,
        navigations: &'t mut NavigationResolver,
        depth: usize,
    ) -> Self {
        Self { ctx, scope, navigations, group_by: None, allow_navigation: true, allow_sequence_members: false, depth }
    }

    pub fn with_group_by(mut self, group_by: Option<&'t GroupBy>) -> Self {
        self.group_by = group_by;
        self
    }

    /// When off, only navigations joined earlier may be referenced.
    pub fn set_allow_navigation(&mut self, allow: bool) {
        self.allow_navigation = allow;
    }

    pub fn set_allow_sequence_members(&mut self, allow: bool) {
        self.allow_sequence_members = allow;
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn resolve_member(&mut self, path: &MemberPath) -> Result<ResolvedMember, OrmError> {
        let metadata = self.ctx.metadata;
        let binding = self.scope.source(&path.source)?.clone();
        let mut key = path.source.clone();
        let mut alias = binding.alias;
        let mut entity = binding.entity;
        let mut derived = binding.derived_columns;
        let mut navigation = None;
        let mut sequence: Option<String> = None;

        for (i, member) in path.members.iter().enumerate() {
            let last = i + 1 == path.members.len();
            let Some(entity_name) = entity.clone() else {
                // anonymous derived table: only its projected names exist
                let known = derived.as_ref().map(|cols| cols.iter().any(|c| c == member)).unwrap_or(false);
                if last && known {
                    return Ok(ResolvedMember::Column { sql: self.ctx.qualify(&alias, member), column: None });
                }
                return Err(TranslationError::UnsupportedMember { entity: path.source.clone(), member: member.clone() }.into());
            };
            let meta = metadata.require(&entity_name)?;

            if let Some(column) = meta.get_column(member) {
                if !last {
                    return Err(TranslationError::UnsupportedMember {
                        entity: meta.name.clone(),
                        member: path.members[i + 1].clone(),
                    }.into());
                }
                if let Some(sequence) = &sequence {
                    if !self.allow_sequence_members {
                        return Err(TranslationError::Unsupported(format!(
                            "'{}' reads a member of the sequence '{}', which would multiply the root rows", path, sequence
                        )).into());
                    }
                }
                let name = if derived.is_some() { &column.member } else { &column.name };
                return Ok(ResolvedMember::Column { sql: self.ctx.qualify(&alias, name), column: Some(column.clone()) });
            }

            let Some(nav) = meta.get_navigation(member) else {
                return Err(TranslationError::UnsupportedMember { entity: meta.name.clone(), member: member.clone() }.into());
            };
            let next_key = format!("{}.{}", key, member);
            if !self.allow_navigation && !self.navigations.contains(&next_key) {
                return Err(TranslationError::Unsupported(format!("navigation '{}' is not joined here", next_key)).into());
            }
            let target = self.navigations.register(self.scope, &next_key, &alias, meta, derived.is_some(), nav)?;
            if nav.many && sequence.is_none() {
                sequence = Some(next_key.clone());
            }
            key = next_key;
            alias = target.alias;
            entity = Some(target.entity);
            derived = None;
            navigation = Some(nav.clone());
        }

        Ok(ResolvedMember::Entity { key, alias, entity, derived_columns: derived, navigation })
    }

    /// Translates in value position.
    pub fn translate(&mut self, expr: &Expr) -> Result<String, OrmError> {
        self.value(expr, None)
    }

    /// Value position, constants typed after `hint`.
    pub fn translate_with_hint(&mut self, expr: &Expr, hint: Option<&ColumnMeta>) -> Result<String, OrmError> {
        self.value(expr, hint)
    }

    fn value(&mut self, expr: &Expr, hint: Option<&ColumnMeta>) -> Result<String, OrmError> {
        if let Expr::Constant(value) = expr {
            return Ok(self.ctx.constant(value.clone(), hint));
        }
        if expr.is_closed() {
            if let Some(value) = ConstantFolder::fold(expr) {
                return Ok(self.ctx.constant(value, hint));
            }
        }
        match expr {
            Expr::Member(path) => match self.resolve_member(path)? {
                ResolvedMember::Column { sql, .. } => Ok(sql),
                ResolvedMember::Entity { key, .. } =>
                    Err(TranslationError::Unsupported(format!("'{}' is an entity and cannot be used as a value", key)).into()),
            },
            Expr::Binary { op, .. } if op.is_predicate() => self.predicate_as_value(expr),
            Expr::Binary { op: BinaryOp::Concat, left, right } => {
                let (l, r) = self.operands(left, right)?;
                self.render(Intrinsic::Concat, &[l, r])
            }
            Expr::Binary { op: BinaryOp::Mod, left, right } => {
                let (l, r) = self.operands(left, right)?;
                self.render(Intrinsic::Modulo, &[l, r])
            }
            Expr::Binary { op, left, right } => {
                let (l, r) = self.operands(left, right)?;
                Ok(format!("({} {} {})", l, op.symbol(), r))
            }
            Expr::Unary { op: UnaryOp::Not, .. } => self.predicate_as_value(expr),
            Expr::Unary { op: UnaryOp::Negate, operand } => Ok(format!("(-{})", self.value(operand, hint)?)),
            Expr::Coalesce { left, right } => {
                // the constant side always goes last
                let swap = matches!(**left, Expr::Constant(_)) && !matches!(**right, Expr::Constant(_));
                let (first, second) = if swap { (right, left) } else { (left, right) };
                let (a, b) = self.operands(first, second)?;
                self.render(Intrinsic::Coalesce, &[a, b])
            }
            Expr::Conditional { test, if_true, if_false } => {
                let test = self.translate_predicate(test)?;
                let a = self.value(if_true, hint)?;
                let b = self.value(if_false, hint)?;
                Ok(format!("CASE WHEN {} THEN {} ELSE {} END", test, a, b))
            }
            Expr::Call { method, args } => {
                let (tag, sql) = self.call(method, args)?;
                if tag.is_predicate() {
                    Ok(format!("CASE WHEN {} THEN 1 ELSE 0 END", sql))
                } else {
                    Ok(sql)
                }
            }
            Expr::InList { .. } | Expr::InQuery { .. } => self.predicate_as_value(expr),
            Expr::Aggregate(call) => self.aggregate(call),
            Expr::GroupKey(name) => {
                let group_by = self.group_by
                    .ok_or_else(|| TranslationError::Unsupported("group key used outside a grouped query".into()))?;
                let key = group_by.key(name.as_deref()).ok_or_else(|| TranslationError::UnsupportedMember {
                    entity: "Key".into(),
                    member: name.clone().unwrap_or_default(),
                })?;
                self.value(key, hint)
            }
            Expr::Constant(_) => Ok(self.ctx.dialect.null_literal().to_string()),
        }
    }

    /// Translates in boolean position (WHERE, HAVING, ON, CASE WHEN).
    pub fn translate_predicate(&mut self, expr: &Expr) -> Result<String, OrmError> {
        if expr.is_closed() {
            match ConstantFolder::fold(expr) {
                Some(DbValue::Bool(true)) => return Ok("1 = 1".into()),
                Some(DbValue::Bool(false)) => return Ok("1 = 0".into()),
                Some(other) =>
                    return Err(TranslationError::Unsupported(format!("constant {} is not a condition", other)).into()),
                None => {}
            }
        }
        match expr {
            Expr::Binary { op: BinaryOp::And, left, right } =>
                Ok(format!("{} AND {}", self.translate_predicate(left)?, self.translate_predicate(right)?)),
            Expr::Binary { op: BinaryOp::Or, left, right } =>
                Ok(format!("({} OR {})", self.translate_predicate(left)?, self.translate_predicate(right)?)),
            Expr::Binary { op, left, right } if op.is_comparison() => self.comparison(*op, left, right),
            Expr::Unary { op: UnaryOp::Not, operand } => Ok(format!("NOT ({})", self.translate_predicate(operand)?)),
            Expr::Call { method, args } if Intrinsic::resolve(method).map(|t| t.is_predicate()).unwrap_or(false) =>
                Ok(self.call(method, args)?.1),
            Expr::InList { expr, list, negated } => self.in_list(expr, list, *negated),
            Expr::InQuery { expr, query, negated } => self.in_query(expr, query, *negated),
            _ => {
                let value = self.value(expr, None)?;
                Ok(format!("{} = {}", value, self.ctx.dialect.bool_literal(true, self.ctx.config)))
            }
        }
    }

    fn predicate_as_value(&mut self, expr: &Expr) -> Result<String, OrmError> {
        Ok(format!("CASE WHEN {} THEN 1 ELSE 0 END", self.translate_predicate(expr)?))
    }

    fn comparison(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<String, OrmError> {
        if left.is_null_constant() || right.is_null_constant() {
            let other = if right.is_null_constant() { left } else { right };
            let sql = self.value(other, None)?;
            return match op {
                BinaryOp::Eq => Ok(format!("{} IS NULL", sql)),
                BinaryOp::Ne => Ok(format!("{} IS NOT NULL", sql)),
                _ => Err(TranslationError::Unsupported(format!("NULL cannot be compared with '{}'", op)).into()),
            };
        }
        let (l, r) = self.operands(left, right)?;
        Ok(format!("{} {} {}", l, op.symbol(), r))
    }

    /// Column metadata of a member expression, used as the type hint of the opposite operand.
    fn member_column(&mut self, expr: &Expr) -> Result<Option<ColumnMeta>, OrmError> {
        match expr {
            Expr::Member(path) => match self.resolve_member(path)? {
                ResolvedMember::Column { column, .. } => Ok(column),
                ResolvedMember::Entity { .. } => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn operands(&mut self, left: &Expr, right: &Expr) -> Result<(String, String), OrmError> {
        let left_column = self.member_column(left)?;
        let right_column = self.member_column(right)?;
        let l = self.value(left, right_column.as_ref())?;
        let r = self.value(right, left_column.as_ref())?;
        Ok((l, r))
    }

    fn render(&self, tag: Intrinsic, args: &[String]) -> Result<String, OrmError> {
        Ok(self.ctx.dialect.functions().render(tag, args)?)
    }

    fn call(&mut self, method: &str, args: &[Expr]) -> Result<(Intrinsic, String), OrmError> {
        let tag = Intrinsic::resolve(method).ok_or_else(|| TranslationError::UnsupportedMethod(method.to_string()))?;
        if !tag.accepts(args.len()) {
            return Err(TranslationError::ArgumentMismatch {
                method: method.to_string(),
                expected: tag.arity_text(),
                found: args.len(),
            }.into());
        }
        let textual = matches!(
            tag,
            Intrinsic::Contains | Intrinsic::StartsWith | Intrinsic::EndsWith | Intrinsic::Replace
                | Intrinsic::IndexOf | Intrinsic::Concat | Intrinsic::Coalesce
        );
        let receiver = match args.first() {
            Some(first) if textual => self.member_column(first)?,
            _ => None,
        };
        let mut rendered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let hint = if i == 0 { None } else { receiver.as_ref() };
            rendered.push(self.value(arg, hint)?);
        }
        Ok((tag, self.render(tag, &rendered)?))
    }

    fn aggregate(&mut self, call: &AggregateCall) -> Result<String, OrmError> {
        let arg = match (&call.arg, call.kind) {
            (Some(arg), _) => self.value(arg, None)?,
            (None, AggregateKind::Count) => "1".to_string(),
            (None, kind) => {
                return Err(TranslationError::ArgumentMismatch {
                    method: kind.name().to_string(),
                    expected: "1".into(),
                    found: 0,
                }.into())
            }
        };
        Ok(self.ctx.dialect.aggregate(call.kind, &arg))
    }

    fn in_list(&mut self, expr: &Expr, list: &[Expr], negated: bool) -> Result<String, OrmError> {
        if list.is_empty() {
            return Ok(if negated { "1 = 1" } else { "1 = 0" }.to_string());
        }
        let hint = self.member_column(expr)?;
        let target = self.value(expr, None)?;
        let mut items = Vec::with_capacity(list.len());
        for item in list {
            items.push(self.value(item, hint.as_ref())?);
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(format!("{} {} ({})", target, keyword, items.join(", ")))
    }

    fn in_query(&mut self, expr: &Expr, query: &SelectQuery, negated: bool) -> Result<String, OrmError> {
        let target = self.value(expr, None)?;
        let nested = SelectCompiler::compile(self.ctx, query, self.scope.child(), self.depth + 1, true)?;
        if nested.columns.len() != 1 {
            return Err(TranslationError::UnsupportedProjection(format!(
                "a subquery used with IN must select exactly one column, found {}",
                nested.columns.len()
            )).into());
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(format!("{} {} (\n{}\n{})", target, keyword, nested.text, self.ctx.pad(self.depth)))
    }
}
