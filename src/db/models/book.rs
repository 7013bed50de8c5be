//! Book models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Academic level a book belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
pub enum BookLevel {
    O,
    A,
}

impl BookLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookLevel::O => "O",
            BookLevel::A => "A",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub level: BookLevel,
    pub class: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    /// JSON array of strings as stored in the row, NULL when no keywords.
    pub keywords: Option<String>,
    pub cover_url: Option<String>,
    pub file_url: Option<String>,
    pub featured: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Book as returned by the API, with keywords decoded into a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub level: BookLevel,
    pub class: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub cover_url: Option<String>,
    pub file_url: Option<String>,
    pub featured: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let keywords = book
            .keywords
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok());
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            level: book.level,
            class: book.class,
            subject: book.subject,
            description: book.description,
            keywords,
            cover_url: book.cover_url,
            file_url: book.file_url,
            featured: book.featured,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub level: BookLevel,
    pub class: Option<String>,
    pub subject: String,
    pub description: Option<String>,
    /// Comma-separated keywords as typed into the form.
    pub keywords: Option<String>,
    pub cover_url: Option<String>,
    pub file_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub level: Option<BookLevel>,
    pub class: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub cover_url: Option<String>,
    pub file_url: Option<String>,
    pub featured: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_rejects_unknown_values() {
        assert!(serde_json::from_str::<BookLevel>("\"O\"").is_ok());
        assert!(serde_json::from_str::<BookLevel>("\"A\"").is_ok());
        assert!(serde_json::from_str::<BookLevel>("\"B\"").is_err());
        assert!(serde_json::from_str::<BookLevel>("\"o\"").is_err());
    }

    #[test]
    fn response_decodes_stored_keywords() {
        let book = Book {
            id: "b1".into(),
            title: "Physics".into(),
            author: "N. Author".into(),
            level: BookLevel::O,
            class: None,
            subject: "Physics".into(),
            description: None,
            keywords: Some("[\"mechanics\",\"waves\"]".into()),
            cover_url: None,
            file_url: None,
            featured: false,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };
        let response = BookResponse::from(book);
        assert_eq!(
            response.keywords,
            Some(vec!["mechanics".to_string(), "waves".to_string()])
        );
    }

    #[test]
    fn response_tolerates_malformed_keywords() {
        let book = Book {
            id: "b2".into(),
            title: "Chemistry".into(),
            author: "N. Author".into(),
            level: BookLevel::A,
            class: None,
            subject: "Chemistry".into(),
            description: None,
            keywords: Some("not json".into()),
            cover_url: None,
            file_url: None,
            featured: false,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };
        assert_eq!(BookResponse::from(book).keywords, None);
    }
}
