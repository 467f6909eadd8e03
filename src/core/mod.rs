pub mod codec;
pub mod realtime;
pub mod session;
pub mod telephony;
pub mod tools;

pub use realtime::{ModelConnector, OpenAIRealtimeConnector, RealtimeError, RealtimeResult};
pub use session::{CallSession, SessionFactory};
pub use tools::{ToolDispatcher, ToolRegistry};
