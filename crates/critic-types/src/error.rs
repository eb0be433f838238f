/// Rejected user input. The message is shown above the re-rendered form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("username is required")]
    UsernameRequired,

    #[error("password is required")]
    PasswordRequired,

    #[error("movie title is required")]
    TitleRequired,

    #[error("content is required")]
    ContentRequired,

    #[error("rating must be a whole number from 1 to 5")]
    InvalidRating,

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}
