pub(crate) type FilterResult<T> = Result<T, FilterError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(FilterError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum FilterError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}
