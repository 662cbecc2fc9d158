// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod google;
pub mod session;
pub mod token;

pub use google::{GoogleOAuth, VerifiedProfile};
pub use token::{Claims, DecodedToken, TokenIssuer};
