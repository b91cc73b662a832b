// Entity Models
//
// Each entity owns its wire mapping (serialize / deserialize) and its
// persistence operations, which always take an explicit connection.

pub mod account;

pub use account::Account;
