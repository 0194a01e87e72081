use thiserror::Error;

/// Terminal failures of a single extraction.
///
/// Field-level anomalies never show up here: a missing or oddly shaped field
/// degrades to an empty/absent value in the record instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("No structured data found on this page")]
    NoStructuredData,

    #[error("No recipe found on this page. The site may not use Schema.org markup.")]
    RecipeNotFound,
}

/// Coarse classification for messages shown to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    Unreachable,
    NoRecipe,
}

impl ExtractError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractError::InvalidUrl { .. } => FailureKind::InvalidInput,
            ExtractError::Fetch { .. } => FailureKind::Unreachable,
            ExtractError::NoStructuredData | ExtractError::RecipeNotFound => FailureKind::NoRecipe,
        }
    }
}

impl FailureKind {
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "That doesn't look like a valid recipe link.",
            FailureKind::Unreachable => "Could not reach that page. Check the link and try again.",
            FailureKind::NoRecipe => "Could not extract a recipe from this page.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let invalid = ExtractError::InvalidUrl {
            url: "nope".into(),
            reason: "relative URL without a base".into(),
        };
        assert_eq!(invalid.kind(), FailureKind::InvalidInput);

        let fetch = ExtractError::Fetch {
            url: "https://example.com".into(),
            reason: "HTTP 404".into(),
        };
        assert_eq!(fetch.kind(), FailureKind::Unreachable);

        assert_eq!(ExtractError::NoStructuredData.kind(), FailureKind::NoRecipe);
        assert_eq!(ExtractError::RecipeNotFound.kind(), FailureKind::NoRecipe);
    }

    #[test]
    fn messages_name_the_url() {
        let e = ExtractError::Fetch {
            url: "https://example.com/r".into(),
            reason: "HTTP 500 Internal Server Error".into(),
        };
        assert_eq!(
            e.to_string(),
            "Failed to fetch https://example.com/r: HTTP 500 Internal Server Error"
        );
    }
}
