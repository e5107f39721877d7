pub mod client;

pub use client::GroqClient;
