//! Code generators for bean derives.

mod derive;

pub use derive::derive_bean_impl;
