// Cucumber step definitions, grouped by feature area.

pub mod local_chain;
pub mod wallets;
pub mod world;

pub use world::LocalnetWorld;
