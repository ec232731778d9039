//! Compressor entries of `.zarray` metadata.
//!
//! These are the numcodecs configurations written verbatim into the array
//! metadata; encoding and decoding is done by `zarrs`.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BLOSC_CLEVEL;

/// Blosc shuffle modes as numcodecs stores them.
pub const BLOSC_NOSHUFFLE: u8 = 0;
pub const BLOSC_SHUFFLE: u8 = 1;
pub const BLOSC_BITSHUFFLE: u8 = 2;

/// Inner codec of a Blosc compressor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloscCname {
    Blosclz,
    Lz4,
    Lz4hc,
    Zlib,
    Zstd,
}

/// `.zarray` compressor entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum Compressor {
    Blosc {
        cname: BloscCname,
        clevel: u8,
        /// One of [`BLOSC_NOSHUFFLE`], [`BLOSC_SHUFFLE`], [`BLOSC_BITSHUFFLE`].
        shuffle: u8,
        /// 0 lets Blosc pick the block size.
        #[serde(default)]
        blocksize: usize,
    },
    Zstd {
        level: i32,
    },
    Gzip {
        level: u32,
    },
}

impl Default for Compressor {
    /// Blosc zstd at level 3 with byte shuffle.
    fn default() -> Self {
        Self::Blosc {
            cname: BloscCname::Zstd,
            clevel: DEFAULT_BLOSC_CLEVEL,
            shuffle: BLOSC_SHUFFLE,
            blocksize: 0,
        }
    }
}
