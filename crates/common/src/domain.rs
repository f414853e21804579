mod object_store;
mod producer;
mod query;
mod record;
mod result;
mod sink;

pub use object_store::*;
pub use producer::*;
pub use query::*;
pub use record::*;
pub use result::*;
pub use sink::*;
