// entities/post.rs
use std::fmt;

use chrono::{DateTime, Utc};
use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

/// Declares a closed set of wire values shared by storage (serde) and the
/// OpenAPI schema (poem-openapi).
macro_rules! choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                #[oai(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|choice| choice.as_str() == value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice! {
    /// Top-level board a post belongs to.
    Section {
        HomemadeDelights => "homemadedelights",
        StudentSelfDefenseAdvocates => "studentselfdefenseadvocates",
    }
}

choice! {
    /// Workflow column, in review order.
    Status {
        StudentFeedback => "student_feedback",
        HelenFeedback => "helen_feedback",
        FinalApproved => "final_approved",
    }
}

choice! {
    PostType {
        Fun => "fun",
        Informational => "informational",
        Research => "research",
        VideoFun => "video_fun",
        VideoInformational => "video_informational",
        VideoResearch => "video_research",
    }
}

impl Default for Section {
    fn default() -> Self {
        Section::HomemadeDelights
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::StudentFeedback
    }
}

impl Default for PostType {
    fn default() -> Self {
        PostType::Fun
    }
}

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Section::HomemadeDelights => "Homemade Delights",
            Section::StudentSelfDefenseAdvocates => "Student Self Defense Advocates",
        }
    }
}

impl PostType {
    pub fn label(self) -> &'static str {
        match self {
            PostType::Fun => "Fun",
            PostType::Informational => "Informational",
            PostType::Research => "Research",
            PostType::VideoFun => "Video Fun",
            PostType::VideoInformational => "Video Informational",
            PostType::VideoResearch => "Video Research",
        }
    }
}

pub const ANONYMOUS: &str = "Anonymous";

fn anonymous() -> String {
    ANONYMOUS.to_string()
}

fn first_revision() -> i64 {
    1
}

/// A comment attached to a post. Append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Object)]
#[serde(rename_all = "camelCase")]
#[oai(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    #[serde(default = "anonymous")]
    pub feedbacker: String,
    #[serde(default)]
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A post as persisted in `notes.json` and returned by the API.
///
/// Records written by older boards may miss the workflow fields; they load
/// with the same defaults the board renderer assumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Object)]
#[serde(rename_all = "camelCase")]
#[oai(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default = "anonymous")]
    pub author: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub section: Section,
    #[serde(default)]
    pub custom_date: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub post_type: PostType,
    #[serde(default = "first_revision")]
    pub revision: i64,
    #[serde(default)]
    pub feedback: Vec<Feedback>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn feedback_by_id(&self, id: &str) -> Option<&Feedback> {
        self.feedback.iter().find(|entry| entry.id == id)
    }
}
