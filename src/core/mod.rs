// Core modules implementing the typed document models, their parsers, and error modeling.
pub mod error;
pub mod expr;
pub mod ops;
pub mod options;
pub mod query;
pub mod request;
pub mod spec_list;
