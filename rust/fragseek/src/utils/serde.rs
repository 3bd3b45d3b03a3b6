use crate::errors::CacheError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
};
use std::path::Path;
use zstd::stream::read::Decoder;
use zstd::stream::write::Encoder;

const ZSTD_LEVEL: i32 = 3;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        source,
        path: path.to_path_buf(),
    }
}

/// Writes `data` as zstd compressed MessagePack.
///
/// The data goes to a sibling temporary file first, which is then renamed over
/// `path`, so readers never see a half written file.
pub fn save_compressed<T: Serialize>(data: &T, path: &Path) -> Result<(), CacheError> {
    let tmp_path = path.with_extension("tmp");
    let file = File::create(&tmp_path).map_err(io_err(&tmp_path))?;
    let mut encoder = Encoder::new(BufWriter::new(file), ZSTD_LEVEL).map_err(io_err(&tmp_path))?;
    rmp_serde::encode::write(&mut encoder, data).map_err(|source| CacheError::Encode {
        source,
        path: tmp_path.clone(),
    })?;
    let writer = encoder.finish().map_err(io_err(&tmp_path))?;
    writer
        .into_inner()
        .map_err(|e| CacheError::Io {
            source: e.into_error(),
            path: tmp_path.clone(),
        })?
        .sync_all()
        .map_err(io_err(&tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(io_err(path))?;
    Ok(())
}

/// Reads data written by [`save_compressed`].
pub fn load_compressed<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    let file = File::open(path).map_err(io_err(path))?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(io_err(path))?;
    rmp_serde::decode::from_read(decoder).map_err(|source| CacheError::Decode {
        source,
        path: path.to_path_buf(),
    })
}
