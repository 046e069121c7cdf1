use std::{
    collections::HashMap,
    sync::Arc,
};

use serde_json::{Map, Value};

use crate::{
    error::MaterializationError,
    materializer::{Assignment, MaterializationPlan, NavigationPlan, RowCursor, ValueConverter},
    value::DbValue,
};

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Field(String),
    Index(usize),
}

type Locator = Vec<Step>;

/// Root entity still collecting rows, with the children already attached to it.
struct PendingRoot {
    value: Value,
    key: Vec<DbValue>,
    /// Per navigation and parent: child key to its index in the parent's list.
    seen: HashMap<String, HashMap<String, usize>>,
}

/// Lazy sequence of hydrated roots. Consecutive rows with the same root key extend one
/// root; the stream holds at most that root and never reads ahead of the cursor.
/// The first error ends the sequence.
pub struct EntityStream<C: RowCursor> {
    cursor: C,
    plan: Arc<MaterializationPlan>,
    pending: Option<PendingRoot>,
    done: bool,
}

impl<C: RowCursor> EntityStream<C> {
    pub fn new(cursor: C, plan: Arc<MaterializationPlan>) -> Self {
        Self { cursor, plan, pending: None, done: false }
    }

    pub fn plan(&self) -> &MaterializationPlan {
        &self.plan
    }

    fn step(&mut self) -> Result<Option<Value>, MaterializationError> {
        loop {
            if !self.cursor.move_next()? {
                self.done = true;
                return Ok(self.pending.take().map(|root| root.value));
            }
            let key = self.plan.root_keys.iter()
                .map(|i| self.cursor.get_value(*i))
                .collect::<Result<Vec<_>, _>>()?;

            let continues = self.plan.has_many
                && !key.is_empty()
                && self.pending.as_ref().map(|root| root.key == key).unwrap_or(false);
            if continues {
                if let Some(root) = self.pending.as_mut() {
                    attach(&self.plan, &self.cursor, root)?;
                }
                continue;
            }

            let mut root = PendingRoot {
                value: Value::Object(decode(&self.cursor, &self.plan.root)?),
                key,
                seen: HashMap::new(),
            };
            attach(&self.plan, &self.cursor, &mut root)?;
            if let Some(previous) = self.pending.replace(root) {
                return Ok(Some(previous.value));
            }
        }
    }
}

impl<C: RowCursor> Iterator for EntityStream<C> {
    type Item = Result<Value, MaterializationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => None,
            Err(err) => {
                self.done = true;
                self.pending = None;
                Some(Err(err))
            }
        }
    }
}

fn decode<C: RowCursor>(cursor: &C, assignments: &[Assignment]) -> Result<Map<String, Value>, MaterializationError> {
    let mut object = Map::new();
    for a in assignments {
        let value = if cursor.is_null(a.index) {
            Value::Null
        } else {
            ValueConverter::convert(cursor.get_value(a.index)?, a.db_type, &a.column)?
        };
        object.insert(a.member.clone(), value);
    }
    Ok(object)
}

fn child_key<C: RowCursor>(cursor: &C, navigation: &NavigationPlan) -> Result<String, MaterializationError> {
    let mut parts = Vec::with_capacity(navigation.key_indices.len());
    for index in &navigation.key_indices {
        parts.push(cursor.get_value(*index)?.to_string());
    }
    Ok(parts.join("|"))
}

fn locator_text(locator: &[Step]) -> String {
    locator.iter()
        .map(|step| match step {
            Step::Field(name) => name.clone(),
            Step::Index(i) => i.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn locate<'v>(root: &'v mut Value, locator: &[Step]) -> Option<&'v mut Value> {
    let mut current = root;
    for step in locator {
        current = match step {
            Step::Field(name) => current.as_object_mut()?.get_mut(name)?,
            Step::Index(i) => current.as_array_mut()?.get_mut(*i)?,
        };
    }
    Some(current)
}

/// Hangs the row's navigations under the pending root, parents before children.
fn attach<C: RowCursor>(plan: &MaterializationPlan, cursor: &C, root: &mut PendingRoot) -> Result<(), MaterializationError> {
    let mut located: HashMap<&str, Locator> = HashMap::new();
    for navigation in &plan.navigations {
        let parent_locator = match &navigation.parent {
            None => Vec::new(),
            Some(parent) => match located.get(parent.as_str()) {
                Some(locator) => locator.clone(),
                // parent absent in this row, so is the child
                None => continue,
            },
        };
        let Some(parent) = locate(&mut root.value, &parent_locator).and_then(Value::as_object_mut) else {
            continue;
        };

        let absent = navigation.split_index.map(|i| cursor.is_null(i)).unwrap_or(false);
        if absent {
            if navigation.many {
                parent.entry(navigation.member.clone()).or_insert_with(|| Value::Array(Vec::new()));
            } else {
                parent.entry(navigation.member.clone()).or_insert(Value::Null);
            }
            continue;
        }

        let mut locator = parent_locator.clone();
        locator.push(Step::Field(navigation.member.clone()));
        if navigation.many {
            let seen_key = format!("{}@{}", navigation.key, locator_text(&parent_locator));
            let child = child_key(cursor, navigation)?;
            let list = parent.entry(navigation.member.clone()).or_insert_with(|| Value::Array(Vec::new()));
            if !list.is_array() {
                *list = Value::Array(Vec::new());
            }
            let seen = root.seen.entry(seen_key).or_default();
            let index = match seen.get(&child) {
                Some(index) => *index,
                None => {
                    let index = list.as_array().map(Vec::len).unwrap_or(0);
                    if let Some(items) = list.as_array_mut() {
                        items.push(Value::Object(decode(cursor, &navigation.assignments)?));
                    }
                    seen.insert(child, index);
                    index
                }
            };
            locator.push(Step::Index(index));
        } else {
            let slot = parent.entry(navigation.member.clone()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::Object(decode(cursor, &navigation.assignments)?);
            }
        }
        located.insert(navigation.key.as_str(), locator);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::materializer::MemoryCursor;

    fn assignment(index: usize, member: &str) -> Assignment {
        Assignment { index, member: member.into(), column: member.into(), db_type: None }
    }

    /// Order(Id, No) + Items(split, Id, Qty) + Payments(split, Id, Amount)
    fn plan() -> Arc<MaterializationPlan> {
        Arc::new(MaterializationPlan {
            target: "Order".into(),
            root: vec![assignment(0, "Id"), assignment(1, "No")],
            root_keys: vec![0],
            navigations: vec![
                NavigationPlan {
                    key: "Items".into(),
                    parent: None,
                    member: "Items".into(),
                    many: true,
                    split_index: Some(2),
                    assignments: vec![assignment(3, "Id"), assignment(4, "Qty")],
                    key_indices: vec![3],
                },
                NavigationPlan {
                    key: "Payments".into(),
                    parent: None,
                    member: "Payments".into(),
                    many: true,
                    split_index: Some(5),
                    assignments: vec![assignment(6, "Id"), assignment(7, "Amount")],
                    key_indices: vec![6],
                },
            ],
            has_many: true,
        })
    }

    fn names() -> Vec<&'static str> {
        vec!["Id", "No", "S1", "Id1", "Qty", "S2", "Id2", "Amount"]
    }

    #[test]
    fn adjacent_rows_of_one_root_are_merged() {
        let cursor = MemoryCursor::from_json(names(), &[
            json!([1, "A", 1, 10, 2, null, null, null]),
            json!([1, "A", 1, 11, 3, null, null, null]),
            json!([2, "B", 2, 12, 1, null, null, null]),
        ]).unwrap();
        let roots: Vec<Value> = EntityStream::new(cursor, plan()).collect::<Result<_, _>>().unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0]["Items"].as_array().unwrap().len(), 2);
        assert_eq!(roots[1]["Items"].as_array().unwrap().len(), 1);
        assert_eq!(roots[0]["Payments"], json!([]));
        assert_eq!(roots[1]["No"], json!("B"));
    }

    #[test]
    fn cross_product_children_are_deduplicated() {
        // two items times two payments
        let cursor = MemoryCursor::from_json(names(), &[
            json!([1, "A", 1, 10, 2, 1, 100, 5]),
            json!([1, "A", 1, 10, 2, 1, 101, 6]),
            json!([1, "A", 1, 11, 3, 1, 100, 5]),
            json!([1, "A", 1, 11, 3, 1, 101, 6]),
        ]).unwrap();
        let roots: Vec<Value> = EntityStream::new(cursor, plan()).collect::<Result<_, _>>().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0]["Items"], json!([{ "Id": 10, "Qty": 2 }, { "Id": 11, "Qty": 3 }]));
        assert_eq!(roots[0]["Payments"], json!([{ "Id": 100, "Amount": 5 }, { "Id": 101, "Amount": 6 }]));
    }

    #[test]
    fn null_split_gives_null_scalar_navigation() {
        let plan = Arc::new(MaterializationPlan {
            target: "Order".into(),
            root: vec![assignment(0, "Id")],
            root_keys: vec![0],
            navigations: vec![NavigationPlan {
                key: "Client".into(),
                parent: None,
                member: "Client".into(),
                many: false,
                split_index: Some(1),
                assignments: vec![assignment(2, "Id"), assignment(3, "Name")],
                key_indices: vec![2],
            }],
            has_many: false,
        });
        let cursor = MemoryCursor::from_json(["Id", "S", "Id1", "Name"], &[
            json!([1, null, null, null]),
            json!([2, 7, 7, "acme"]),
        ]).unwrap();
        let roots: Vec<Value> = EntityStream::new(cursor, plan).collect::<Result<_, _>>().unwrap();
        assert_eq!(roots[0]["Client"], Value::Null);
        assert_eq!(roots[1]["Client"], json!({ "Id": 7, "Name": "acme" }));
    }

    #[test]
    fn nested_sequences_attach_to_existing_children() {
        let plan = Arc::new(MaterializationPlan {
            target: "Order".into(),
            root: vec![assignment(0, "Id")],
            root_keys: vec![0],
            navigations: vec![
                NavigationPlan {
                    key: "Items".into(),
                    parent: None,
                    member: "Items".into(),
                    many: true,
                    split_index: Some(1),
                    assignments: vec![assignment(2, "Id")],
                    key_indices: vec![2],
                },
                NavigationPlan {
                    key: "Items.Notes".into(),
                    parent: Some("Items".into()),
                    member: "Notes".into(),
                    many: true,
                    split_index: Some(3),
                    assignments: vec![assignment(4, "Id")],
                    key_indices: vec![4],
                },
            ],
            has_many: true,
        });
        let cursor = MemoryCursor::from_json(["Id", "S1", "Id1", "S2", "Id2"], &[
            json!([1, 1, 10, 10, 500]),
            json!([1, 1, 10, 10, 501]),
            json!([1, 1, 11, null, null]),
        ]).unwrap();
        let roots: Vec<Value> = EntityStream::new(cursor, plan).collect::<Result<_, _>>().unwrap();
        assert_eq!(roots[0], json!({
            "Id": 1,
            "Items": [
                { "Id": 10, "Notes": [{ "Id": 500 }, { "Id": 501 }] },
                { "Id": 11, "Notes": [] }
            ]
        }));
    }

    #[test]
    fn errors_end_the_sequence() {
        let mut plan = (*plan()).clone();
        plan.root[1].db_type = Some(crate::metadata::DbType::Int);
        let cursor = MemoryCursor::from_json(names(), &[
            json!([1, "A", null, null, null, null, null, null]),
            json!([2, "B", null, null, null, null, null, null]),
        ]).unwrap();
        let mut stream = EntityStream::new(cursor, Arc::new(plan));
        assert!(matches!(stream.next(), Some(Err(MaterializationError::Conversion { .. }))));
        assert!(stream.next().is_none());
    }
}
