pub mod post;

pub use post::{ANONYMOUS, Feedback, Post, PostType, Section, Status};
