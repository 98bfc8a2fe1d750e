//! CLI commands.

pub mod inspect;
pub mod render;
pub mod run;

pub use inspect::{GrantsCommand, TopicsCommand};
pub use render::RenderCommand;
pub use run::{ApplyCommand, DestroyCommand, RefreshCommand};
