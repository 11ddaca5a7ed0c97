mod listener;
mod single;

pub use listener::{bridge, CancelFn, EventSink, ListenerHandle, ListenerStream};
pub use single::{single_result, Resolver, SingleResult};
