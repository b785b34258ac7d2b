pub(crate) use crate::config::Config;
pub(crate) use crate::error::{bail, HappyError, HappyResult};
pub(crate) use crate::progress::ProgressBarBuilder;
