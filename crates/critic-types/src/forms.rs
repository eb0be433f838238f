use serde::Deserialize;

use crate::ValidationError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

// Every field defaults so that a form with missing fields still reaches the
// CSRF check instead of being rejected by the extractor.

// -- Auth --

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl RegisterForm {
    /// Passwords are compared and stored exactly as typed; only the
    /// username is trimmed.
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        if self.password1 != self.password2 {
            return Err(ValidationError::PasswordMismatch);
        }
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError::UsernameRequired);
        }
        if self.password1.is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(NewUser {
            username: username.to_string(),
            password: self.password1.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Body of forms that carry nothing but the token (logout).
#[derive(Debug, Default, Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

// -- Reviews --

#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub movie_title: String,
    #[serde(default)]
    pub content: String,
    /// One entry per checked box; blank entries are ignored.
    #[serde(default)]
    pub category_ids: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ReviewInput {
    pub movie_title: String,
    pub content: String,
    pub category_ids: Vec<i64>,
}

impl ReviewForm {
    /// `known_categories` is the set of ids present in the categories table;
    /// anything else is rejected.
    pub fn validate(&self, known_categories: &[i64]) -> Result<ReviewInput, ValidationError> {
        let movie_title = self.movie_title.trim();
        if movie_title.is_empty() {
            return Err(ValidationError::TitleRequired);
        }
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ValidationError::ContentRequired);
        }

        let mut category_ids = Vec::with_capacity(self.category_ids.len());
        for raw in self.category_ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let id = raw
                .parse::<i64>()
                .ok()
                .filter(|id| known_categories.contains(id))
                .ok_or_else(|| ValidationError::UnknownCategory(raw.to_string()))?;
            if !category_ids.contains(&id) {
                category_ids.push(id);
            }
        }

        Ok(ReviewInput {
            movie_title: movie_title.to_string(),
            content: content.to_string(),
            category_ids,
        })
    }

    /// Selected ids that still parse, for re-checking boxes after a failed submit.
    pub fn selected_ids(&self) -> Vec<i64> {
        self.category_ids.iter().filter_map(|s| s.trim().parse().ok()).collect()
    }
}

// -- Comments --

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub csrf_token: String,
    /// Only sent when creating a comment.
    #[serde(default)]
    pub review_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub rating: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CommentInput {
    pub content: String,
    pub rating: i64,
}

impl CommentForm {
    pub fn review_id(&self) -> Option<i64> {
        self.review_id.trim().parse().ok()
    }

    pub fn validate(&self) -> Result<CommentInput, ValidationError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ValidationError::ContentRequired);
        }
        let rating = parse_rating(&self.rating)?;
        Ok(CommentInput {
            content: content.to_string(),
            rating,
        })
    }
}

pub fn parse_rating(raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or(ValidationError::InvalidRating)
}

// -- Misc --

/// Delete confirmation. Nothing is deleted unless `confirm` is present.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub csrf_token: String,
    pub confirm: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, p1: &str, p2: &str) -> RegisterForm {
        RegisterForm {
            csrf_token: String::new(),
            username: username.into(),
            password1: p1.into(),
            password2: p2.into(),
        }
    }

    #[test]
    fn register_checks_in_order() {
        assert_eq!(register("", "a", "b").validate(), Err(ValidationError::PasswordMismatch));
        assert_eq!(register("  ", "a", "a").validate(), Err(ValidationError::UsernameRequired));
        assert_eq!(register("ann", "", "").validate(), Err(ValidationError::PasswordRequired));

        let user = register("  ann ", "pw", "pw").validate().unwrap();
        assert_eq!(user.username, "ann");
        assert_eq!(user.password, "pw");
    }

    #[test]
    fn review_requires_title_and_content() {
        let mut form = ReviewForm {
            movie_title: " ".into(),
            content: "body".into(),
            ..Default::default()
        };
        assert_eq!(form.validate(&[]), Err(ValidationError::TitleRequired));

        form.movie_title = "Title".into();
        form.content = "\n".into();
        assert_eq!(form.validate(&[]), Err(ValidationError::ContentRequired));
    }

    #[test]
    fn review_category_ids() {
        let form = ReviewForm {
            movie_title: " Vertigo ".into(),
            content: " Spiral. ".into(),
            category_ids: vec!["3".into(), "".into(), "1".into(), "3".into()],
            ..Default::default()
        };
        let input = form.validate(&[1, 2, 3]).unwrap();
        assert_eq!(input.movie_title, "Vertigo");
        assert_eq!(input.content, "Spiral.");
        assert_eq!(input.category_ids, vec![3, 1]);

        assert_eq!(
            form.validate(&[1, 2]),
            Err(ValidationError::UnknownCategory("3".into()))
        );

        let bogus = ReviewForm {
            movie_title: "x".into(),
            content: "y".into(),
            category_ids: vec!["abc".into()],
            ..Default::default()
        };
        assert_eq!(
            bogus.validate(&[1]),
            Err(ValidationError::UnknownCategory("abc".into()))
        );
        assert!(bogus.selected_ids().is_empty());
    }

    #[test]
    fn rating_bounds() {
        for ok in ["1", "2", "3", "4", " 5 "] {
            assert!(parse_rating(ok).is_ok(), "{ok} should be accepted");
        }
        for bad in ["0", "6", "-1", "", "three", "2.5"] {
            assert_eq!(parse_rating(bad), Err(ValidationError::InvalidRating), "{bad}");
        }
    }

    #[test]
    fn comment_validation() {
        let form = CommentForm {
            review_id: " 7 ".into(),
            content: " nice ".into(),
            rating: "4".into(),
            ..Default::default()
        };
        assert_eq!(form.review_id(), Some(7));
        assert_eq!(
            form.validate(),
            Ok(CommentInput {
                content: "nice".into(),
                rating: 4
            })
        );

        let empty = CommentForm {
            rating: "4".into(),
            ..Default::default()
        };
        assert_eq!(empty.review_id(), None);
        assert_eq!(empty.validate(), Err(ValidationError::ContentRequired));
    }
}
