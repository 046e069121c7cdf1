use crate::translator::{ColumnDescriptors, NavigationDescriptors, Parameter, ParameterDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Compiled statement handed to the execution layer. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: CommandKind,
    text: String,
    parameters: Vec<Parameter>,
    columns: ColumnDescriptors,
    navigations: NavigationDescriptors,
    has_many: bool,
    entity: Option<String>,
    root_keys: Vec<usize>,
    identity_member: Option<String>,
}

impl Command {
    pub(crate) fn new(kind: CommandKind, text: String, parameters: Vec<Parameter>) -> Self {
        Self {
            kind,
            text,
            parameters,
            columns: ColumnDescriptors::new(),
            navigations: NavigationDescriptors::new(),
            has_many: false,
            entity: None,
            root_keys: Vec::new(),
            identity_member: None,
        }
    }

    pub(crate) fn with_rows(
        mut self,
        columns: ColumnDescriptors,
        navigations: NavigationDescriptors,
        has_many: bool,
        entity: Option<String>,
        root_keys: Vec<usize>,
    ) -> Self {
        self.columns = columns;
        self.navigations = navigations;
        self.has_many = has_many;
        self.entity = entity;
        self.root_keys = root_keys;
        self
    }

    pub(crate) fn with_identity(mut self, entity: &str, member: &str) -> Self {
        self.entity = Some(entity.to_string());
        self.identity_member = Some(member.to_string());
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn output_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.direction == ParameterDirection::Output)
    }

    pub fn columns(&self) -> &ColumnDescriptors {
        &self.columns
    }

    pub fn navigations(&self) -> &NavigationDescriptors {
        &self.navigations
    }

    pub fn has_many(&self) -> bool {
        self.has_many
    }

    /// Entity the rows (or the inserted values) belong to.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn root_keys(&self) -> &[usize] {
        &self.root_keys
    }

    /// Member patched with the generated id after an insert.
    pub fn identity_member(&self) -> Option<&str> {
        self.identity_member.as_deref()
    }
}
