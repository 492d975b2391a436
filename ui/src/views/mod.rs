mod wrapped;
pub use wrapped::{ProfileState, WrappedPage, WrappedScreen};
