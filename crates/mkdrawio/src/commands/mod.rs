//! CLI command implementations.

pub(crate) mod embed;

pub(crate) use embed::EmbedArgs;
