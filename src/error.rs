// Fatal error kinds. Nothing is retried: every variant ends the program.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Serial write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Terminal error: {0}")]
    Terminal(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
