// # Address Cache Implementations
//
// This module provides implementations of the AddressCache trait.

pub mod memory;

pub use memory::MemoryAddressCache;
