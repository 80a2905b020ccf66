/// Submodule for the error enums and their conversions.
pub mod types;
