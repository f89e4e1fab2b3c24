//! External capabilities used by the stages.
//!
//! Stages never spawn processes or open sockets directly; they go through
//! these traits so tests can substitute scripted fakes.

pub mod command;
pub mod http;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use http::{HttpClient, UreqClient};
