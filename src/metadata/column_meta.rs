use serde::Deserialize;

use crate::metadata::DbType;

fn default_true() -> bool { true }

/// One member of an entity and the column backing it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnMeta {
    pub member: String,
    /// Database column name; empty means "same as member" and is filled in at registration.
    #[serde(default)]
    pub name: String,
    pub db_type: DbType,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default = "default_true")]
    pub is_mapped: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub scale: Option<u8>,
}

impl ColumnMeta {
    pub fn new(member: &str, db_type: DbType) -> Self {
        Self {
            member: member.to_string(),
            name: member.to_string(),
            db_type,
            is_key: false,
            is_identity: false,
            is_mapped: true,
            nullable: false,
            size: None,
            precision: None,
            scale: None,
        }
    }

    pub fn key(member: &str, db_type: DbType) -> Self {
        Self { is_key: true, ..Self::new(member, db_type) }
    }

    /// Auto-increment key column.
    pub fn identity(member: &str) -> Self {
        Self { is_key: true, is_identity: true, ..Self::new(member, DbType::Int) }
    }

    pub fn column_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn not_mapped(mut self) -> Self {
        self.is_mapped = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Scale only, used by temporal columns for fractional seconds.
    pub fn scale(mut self, scale: u8) -> Self {
        self.scale = Some(scale);
        self
    }
}
