use validator::{Validate, ValidationErrors};

use crate::entities::{ANONYMOUS, PostType, Section, Status};

/// Payload for creating a post, as submitted by a client.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct NewNote {
    #[validate(length(max = 200, message = "Author name is too long."))]
    pub author: Option<String>,
    pub content: Option<String>,
    pub section: Option<String>,
    pub status: Option<String>,
    pub post_type: Option<String>,
    #[validate(range(min = 1, message = "Revision must be a whole number of at least 1."))]
    pub revision: Option<i64>,
    pub custom_date: Option<String>,
    #[validate(length(max = 2048, message = "Link is too long."))]
    pub link: Option<String>,
}

/// Partial update. `None` leaves a field untouched; for the nullable fields
/// `Some(None)` clears the stored value.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct NotePatch {
    #[validate(length(max = 200, message = "Author name is too long."))]
    pub author: Option<String>,
    pub content: Option<Option<String>>,
    pub section: Option<String>,
    pub status: Option<String>,
    pub post_type: Option<String>,
    #[validate(range(min = 1, message = "Revision must be a whole number of at least 1."))]
    pub revision: Option<i64>,
    pub custom_date: Option<Option<String>>,
    pub link: Option<Option<String>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedbackDraft {
    pub feedbacker: Option<String>,
    pub text: Option<String>,
}

/// Create payload after validation, with every default applied.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ValidNote {
    pub author: String,
    pub content: Option<String>,
    pub section: Section,
    pub status: Status,
    pub post_type: PostType,
    pub revision: i64,
    pub custom_date: Option<String>,
    pub link: Option<String>,
}

/// Patch after validation; enum fields are parsed.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ValidPatch {
    pub author: Option<String>,
    pub content: Option<Option<String>>,
    pub section: Option<Section>,
    pub status: Option<Status>,
    pub post_type: Option<PostType>,
    pub revision: Option<i64>,
    pub custom_date: Option<Option<String>>,
    pub link: Option<Option<String>>,
}

const SECTION_REQUIRED: &str =
    "Valid section is required (homemadedelights or studentselfdefenseadvocates).";
const STATUS_REQUIRED: &str =
    "Valid status is required (student_feedback, helen_feedback, or final_approved).";
const POST_TYPE_REQUIRED: &str = "Valid post type is required.";

/// Trims and collapses blank text to `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn author_or_anonymous(value: Option<&str>) -> String {
    non_blank(value).unwrap_or_else(|| ANONYMOUS.to_string())
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request.".to_string())
}

fn parse_required<T>(
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    message: &str,
) -> Result<T, String> {
    value.and_then(parse).ok_or_else(|| message.to_string())
}

fn parse_optional<T>(
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    message: &str,
) -> Result<Option<T>, String> {
    match value {
        None => Ok(None),
        Some(raw) => parse(raw).map(Some).ok_or_else(|| message.to_string()),
    }
}

impl NewNote {
    pub(crate) fn check(&self) -> Result<ValidNote, String> {
        let section = parse_required(self.section.as_deref(), Section::parse, SECTION_REQUIRED)?;
        let status = parse_required(self.status.as_deref(), Status::parse, STATUS_REQUIRED)?;
        let post_type =
            parse_required(self.post_type.as_deref(), PostType::parse, POST_TYPE_REQUIRED)?;
        self.validate().map_err(|e| first_message(&e))?;

        Ok(ValidNote {
            author: author_or_anonymous(self.author.as_deref()),
            content: non_blank(self.content.as_deref()),
            section,
            status,
            post_type,
            revision: self.revision.unwrap_or(1),
            custom_date: non_blank(self.custom_date.as_deref()),
            link: non_blank(self.link.as_deref()),
        })
    }
}

impl NotePatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn check(&self) -> Result<ValidPatch, String> {
        let section = parse_optional(self.section.as_deref(), Section::parse, "Invalid section.")?;
        let status = parse_optional(self.status.as_deref(), Status::parse, "Invalid status.")?;
        let post_type =
            parse_optional(self.post_type.as_deref(), PostType::parse, "Invalid post type.")?;
        self.validate().map_err(|e| first_message(&e))?;

        let clear_blank = |field: &Option<Option<String>>| {
            field.as_ref().map(|value| non_blank(value.as_deref()))
        };

        Ok(ValidPatch {
            author: self
                .author
                .as_deref()
                .map(|author| author_or_anonymous(Some(author))),
            content: clear_blank(&self.content),
            section,
            status,
            post_type,
            revision: self.revision,
            custom_date: clear_blank(&self.custom_date),
            link: clear_blank(&self.link),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new() -> NewNote {
        NewNote {
            author: Some("  Alice ".into()),
            content: Some("Hi".into()),
            section: Some("homemadedelights".into()),
            status: Some("student_feedback".into()),
            post_type: Some("fun".into()),
            ..NewNote::default()
        }
    }

    #[test]
    fn new_note_applies_defaults() {
        let note = valid_new().check().unwrap();
        assert_eq!(note.author, "Alice");
        assert_eq!(note.revision, 1);
        assert_eq!(note.link, None);
        assert_eq!(note.post_type, PostType::Fun);
    }

    #[test]
    fn blank_author_becomes_anonymous() {
        let note = NewNote {
            author: Some("   ".into()),
            ..valid_new()
        };
        assert_eq!(note.check().unwrap().author, ANONYMOUS);
    }

    #[test]
    fn enum_fields_are_checked_in_order() {
        let note = NewNote {
            section: None,
            status: Some("nope".into()),
            ..valid_new()
        };
        assert_eq!(note.check().unwrap_err(), SECTION_REQUIRED);

        let note = NewNote {
            status: Some("nope".into()),
            ..valid_new()
        };
        assert_eq!(note.check().unwrap_err(), STATUS_REQUIRED);

        let note = NewNote {
            post_type: Some("video".into()),
            ..valid_new()
        };
        assert_eq!(note.check().unwrap_err(), POST_TYPE_REQUIRED);
    }

    #[test]
    fn revision_must_be_positive() {
        let note = NewNote {
            revision: Some(0),
            ..valid_new()
        };
        assert_eq!(
            note.check().unwrap_err(),
            "Revision must be a whole number of at least 1."
        );
    }

    #[test]
    fn patch_can_clear_nullable_fields() {
        let patch = NotePatch {
            link: Some(None),
            content: Some(Some("  ".into())),
            ..NotePatch::default()
        };
        let valid = patch.check().unwrap();
        assert_eq!(valid.link, Some(None));
        assert_eq!(valid.content, Some(None));
        assert_eq!(valid.custom_date, None);
    }

    #[test]
    fn patch_rejects_unknown_status() {
        let patch = NotePatch {
            status: Some("archived".into()),
            ..NotePatch::default()
        };
        assert_eq!(patch.check().unwrap_err(), "Invalid status.");
    }
}
