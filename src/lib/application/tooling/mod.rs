mod connect;
mod error;
mod http;
mod interface;
mod process;
mod rpc;

pub use connect::{ConnectedServer, connect, establish};
pub use error::ToolInvokeError;
pub use http::{HttpSession, PROTOCOL_HEADER, SESSION_HEADER};
pub use interface::{ServerInfo, ToolSession};
pub use process::StdioSession;
pub use rpc::PROTOCOL_VERSION;
