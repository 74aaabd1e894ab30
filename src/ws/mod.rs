pub mod command;
pub mod hub;
pub mod identity;
pub mod registry;
pub mod session;
pub mod shutdown;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
