//! Resource endpoints

pub mod client;
pub mod content;

pub use client::SocialContextClient;
pub use content::ContentEndpoint;
