// Game session, loop orchestrator, render frame derivation

pub mod events;
pub mod orchestrator;
pub mod render;
mod session;

pub use events::{EventBus, SessionCommand, SessionEvent};
pub use orchestrator::{InputEdge, LoopConfig, LoopExit, run};
pub use render::{NoteSprite, NullRenderer, RenderFault, RenderFrame, Renderer};
pub use session::{AudioSource, GameSession, SessionOptions, SessionState};
