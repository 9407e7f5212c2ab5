pub mod suppliers;

pub use suppliers::{StaticDirectory, SupplierDirectory};
