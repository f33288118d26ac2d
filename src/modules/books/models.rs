use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};

/// A stored book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Identifier assigned by the store
    pub id: i64,
    /// Title of the book
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Rating, unbounded
    pub rating: i32,
}

impl Book {
    pub fn builder() -> BookBuilder {
        BookBuilder::default()
    }

    /// Overwrite the mutable fields from `payload`; `id` is left untouched.
    pub fn apply(&mut self, payload: BookPayload) {
        self.name = payload.name;
        self.description = payload.description;
        self.rating = payload.rating;
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookBuilder {
    id: i64,
    name: String,
    description: Option<String>,
    rating: i32,
}

impl BookBuilder {
    pub fn id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }

    pub fn build(self) -> Book {
        Book {
            id: self.id,
            name: self.name,
            description: self.description,
            rating: self.rating,
        }
    }
}

/// Request body for both create and update.
///
/// `id` is ignored on create and required on update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookPayload {
    #[garde(skip)]
    #[serde(default)]
    pub id: Option<i64>,
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    #[serde(default)]
    pub description: Option<String>,
    #[garde(skip)]
    #[serde(default, deserialize_with = "null_as_zero")]
    pub rating: i32,
}

/// An explicit `null` rating reads as 0, the same as an omitted one.
fn null_as_zero<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert form of a book; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub name: String,
    pub description: Option<String>,
    pub rating: i32,
}

impl From<BookPayload> for NewBook {
    fn from(payload: BookPayload) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            rating: payload.rating,
        }
    }
}
