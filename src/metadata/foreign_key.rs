use serde::Deserialize;

const CONSTANT_PREFIX: &str = "const:";

/// One side of a foreign-key pair: a member of the entity, or a raw SQL constant
/// (written `const:<sql>` in metadata files).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum KeyRef {
    Column(String),
    Constant(String),
}

impl From<String> for KeyRef {
    fn from(value: String) -> Self {
        match value.strip_prefix(CONSTANT_PREFIX) {
            Some(constant) => KeyRef::Constant(constant.to_string()),
            None => KeyRef::Column(value),
        }
    }
}

impl From<&str> for KeyRef {
    fn from(value: &str) -> Self {
        KeyRef::from(value.to_string())
    }
}

impl KeyRef {
    pub fn member(&self) -> Option<&str> {
        match self {
            KeyRef::Column(m) => Some(m),
            KeyRef::Constant(_) => None,
        }
    }
}

/// Composite key pairs of a navigation. `inner_keys` are members of the owning entity,
/// `outer_keys` members of the navigated one; both have the same length.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForeignKey {
    pub inner_keys: Vec<KeyRef>,
    pub outer_keys: Vec<KeyRef>,
}

impl ForeignKey {
    pub fn new<I, O>(inner_keys: I, outer_keys: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<KeyRef>,
        O: IntoIterator,
        O::Item: Into<KeyRef>,
    {
        Self {
            inner_keys: inner_keys.into_iter().map(Into::into).collect(),
            outer_keys: outer_keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(inner: &str, outer: &str) -> Self {
        Self::new([inner], [outer])
    }

    pub fn is_balanced(&self) -> bool {
        !self.inner_keys.is_empty() && self.inner_keys.len() == self.outer_keys.len()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&KeyRef, &KeyRef)> {
        self.inner_keys.iter().zip(self.outer_keys.iter())
    }

    /// First outer member, used as the split column of a LEFT JOINed navigation.
    pub fn split_member(&self) -> Option<&str> {
        self.outer_keys.iter().find_map(KeyRef::member)
    }
}
