pub mod args;
pub mod config;
pub mod detector;
pub mod overlay;
pub mod pipeline;
pub mod playback;
pub mod saccade;
pub mod session;
pub mod types;

pub use pipeline::Renderer;
pub use session::Session;
pub use types::Frame;
