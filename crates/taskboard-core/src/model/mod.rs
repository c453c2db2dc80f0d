//! Persisted entities of the project → user story → task hierarchy.

pub mod entities;
pub mod id;
pub mod status;

pub use entities::{ActivityLogEntry, Project, Task, UserStory};
pub use id::{EntityKind, new_id};
pub use status::{ParseEnumError, TaskStatus};
