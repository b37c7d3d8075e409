use crate::result::CategoryValidationError;
use chrono::{DateTime, Utc};
use engine::store::Entity;
use optional_field::Field;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl Display for CategoryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub store_count: u64,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &CategoryId {
        &self.id
    }
}

impl Category {
    pub fn create(id: CategoryId, new_category: NewCategory) -> Self {
        Self {
            id,
            name: new_category.name,
            description: new_category.description,
            parent_id: new_category.parent_id,
            is_active: new_category.is_active,
            store_count: 0,
            created: Utc::now(),
            updated: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub is_active: bool,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            parent_id: None,
            is_active: true,
        }
    }

    pub fn under(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::MissingName);
        }
        Ok(())
    }
}

/// Changes to an existing category. `None`/[`Field::Missing`] leaves a value as it is,
/// `Field::Present(None)` clears a nullable one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PatchCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "missing", skip_serializing_if = "Field::is_missing")]
    pub description: Field<String>,
    #[serde(default = "missing", skip_serializing_if = "Field::is_missing")]
    pub parent_id: Field<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Absent fields deserialize as unchanged rather than cleared.
fn missing<T>() -> Field<T> {
    Field::Missing
}

impl Default for PatchCategory {
    fn default() -> Self {
        Self {
            name: None,
            description: Field::Missing,
            parent_id: Field::Missing,
            is_active: None,
        }
    }
}

impl PatchCategory {
    pub fn new(name: Option<String>, description: Field<String>) -> Self {
        Self {
            name,
            description,
            ..Default::default()
        }
    }

    pub fn activate(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }

    pub fn validate(&self, id: CategoryId) -> Result<(), CategoryValidationError> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(CategoryValidationError::MissingName);
        }
        if self.parent_id == Field::Present(Some(id)) {
            return Err(CategoryValidationError::OwnParent);
        }
        Ok(())
    }

    pub fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Field::Present(description) = self.description {
            category.description = description;
        }
        if let Field::Present(parent_id) = self.parent_id {
            category.parent_id = parent_id;
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
        category.updated = Some(Utc::now());
    }
}
