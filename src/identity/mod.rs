pub mod wallet;

pub use wallet::{RecoverableSignature, Wallet};
