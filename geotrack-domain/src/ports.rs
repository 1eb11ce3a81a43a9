// Store Port Traits (Interfaces)
// Define what the domain needs from infrastructure

pub mod stores;

pub use stores::*;
