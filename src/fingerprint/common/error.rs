use thiserror::Error;

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Artifact store failure: {0}")]
    ArtifactStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FingerprintError>;
