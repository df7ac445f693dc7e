//! Encoded, read-only projection of the input table.

mod dictionary;
mod view;

pub use dictionary::Dictionary;
pub use view::{DatasetView, QuasiIdentifier, SensitiveAttribute};
