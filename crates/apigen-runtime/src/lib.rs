pub mod client;
pub mod error;
pub mod fields;
pub mod http;
pub mod query;
pub mod response;
pub mod server;
pub mod spec;
pub mod style;

pub use client::{PendingRequest, RequestEditor, Transport};
pub use error::{
    BindingError, BuildError, ClientError, DecodeError, FieldError, SpecError, StyleError,
    TransportError,
};
pub use http::Method;
pub use query::FormPairs;
pub use response::RawResponse;
pub use server::{BoxFuture, Handler, HandlerError, IncomingRequest, Reply, RouteTable, Router};
pub use style::{ParamShape, Primitive, Style};
