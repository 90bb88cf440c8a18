// Digital marker decoding for emocon: raw channel ingestion and coincidence decoding.

pub mod channels;
pub mod decoder;
pub mod error;

pub use channels::DigitalChannels;
pub use decoder::DigitalEventDecoder;
pub use error::DecodeError;
