pub mod conversions;
pub mod dispatch;
pub mod invocation;
pub mod naming;
pub mod operation;
mod scratch;
pub mod toolkit;

pub use self::{
    dispatch::{DispatchError, dispatch},
    invocation::{Invocation, Number, ResolveError},
    naming::{ImageName, OutputType},
    operation::{Layout, Operation, Parameter},
    toolkit::{Runner, SystemRunner, ToolCommand, ToolError},
};
