pub mod health;
pub mod render_handler;

pub use health::health_check;
pub use render_handler::{render_github, render_url};
