use crate::result::RatingValidationError;
use chrono::{DateTime, Utc};
use engine::store::Entity;
use optional_field::Field;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
pub const MAX_IMAGES: usize = 5;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
#[repr(transparent)]
#[serde(transparent)]
pub struct RatingId(pub u64);

impl Display for RatingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
#[repr(transparent)]
#[serde(transparent)]
pub struct StoreId(pub u64);

impl Display for StoreId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
#[repr(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Rating {
    pub id: RatingId,
    pub store_id: StoreId,
    pub user_id: UserId,
    pub score: u8,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u64,
}

impl Entity for Rating {
    type Id = RatingId;

    fn id(&self) -> &RatingId {
        &self.id
    }
}

impl Rating {
    pub fn create(id: RatingId, new_rating: NewRating) -> Self {
        Self {
            id,
            store_id: new_rating.store_id,
            user_id: new_rating.user_id,
            score: new_rating.score,
            text: new_rating.text,
            images: new_rating.images,
            tags: new_rating.tags,
            created_at: Utc::now(),
            likes: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NewRating {
    pub store_id: StoreId,
    pub user_id: UserId,
    pub score: u8,
    pub text: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

impl NewRating {
    pub fn new(store_id: StoreId, user_id: impl Into<String>, score: u8) -> Self {
        Self {
            store_id,
            user_id: UserId(user_id.into()),
            score,
            text: None,
            images: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), RatingValidationError> {
        validate_score(self.score)?;
        if self.user_id.0.trim().is_empty() {
            return Err(RatingValidationError::MissingUser);
        }
        if self.images.len() > MAX_IMAGES {
            return Err(RatingValidationError::TooManyImages);
        }
        Ok(())
    }
}

fn validate_score(score: u8) -> Result<(), RatingValidationError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(RatingValidationError::ScoreOutOfRange(score))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PatchRating {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default = "missing", skip_serializing_if = "Field::is_missing")]
    pub text: Field<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Absent fields deserialize as unchanged rather than cleared.
fn missing<T>() -> Field<T> {
    Field::Missing
}

impl Default for PatchRating {
    fn default() -> Self {
        Self {
            score: None,
            text: Field::Missing,
            images: None,
            tags: None,
        }
    }
}

impl PatchRating {
    pub fn score(score: u8) -> Self {
        Self {
            score: Some(score),
            ..Default::default()
        }
    }

    pub fn text(text: Field<String>) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RatingValidationError> {
        if let Some(score) = self.score {
            validate_score(score)?;
        }
        if self.images.as_ref().is_some_and(|images| images.len() > MAX_IMAGES) {
            return Err(RatingValidationError::TooManyImages);
        }
        Ok(())
    }

    pub fn apply(self, rating: &mut Rating) {
        if let Some(score) = self.score {
            rating.score = score;
        }
        if let Field::Present(text) = self.text {
            rating.text = text;
        }
        if let Some(images) = self.images {
            rating.images = images;
        }
        if let Some(tags) = self.tags {
            rating.tags = tags;
        }
    }
}
