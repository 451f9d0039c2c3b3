//! # API Route Modules
//!
//! | Prefix                  | Module            |
//! |-------------------------|-------------------|
//! | `/api/certificates/*`   | [`certificates`]  |
//! | `/api/records`          | [`certificates`]  |

pub mod certificates;
