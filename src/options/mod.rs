// =============================================================================
// Options Module
// =============================================================================
//
// Maps a directional signal onto a concrete tradable contract: expiry choice
// from the vendor's ordered expiration list, then the strike nearest the
// underlying's current price.

pub mod selector;

pub use selector::{choose_expiry, select_contract};
