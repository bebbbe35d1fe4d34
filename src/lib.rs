//! Listing persistence for a community rental board.
//!
//! A [`repository::ListingRepository`] reads and writes the whole listing
//! collection against a remote HTTP store when one is reachable, and against
//! an on-device slot otherwise. Photos are compressed by
//! [`encoder::PhotoEncoder`] and moved to the remote host by
//! [`transport::ImageTransport`].

pub mod board;
pub mod config;
pub mod data_url;
pub mod encoder;
pub mod environment;
pub mod listing;
pub mod repository;
pub mod storage;
pub mod transport;

pub use board::{AdminCredentials, Board, BoardError};
pub use config::Config;
pub use listing::{ImageRef, Listing, ListingDraft};
pub use repository::ListingRepository;
