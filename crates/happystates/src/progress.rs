use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Builds progress bars with a common look. A bar created for a
/// quiet run is hidden.
pub(crate) struct ProgressBarBuilder {
    template: String,
    quiet: bool,
    len: Option<u64>,
}

impl ProgressBarBuilder {
    pub(crate) fn new<T: ToString>(template: T, quiet: bool) -> Self {
        Self {
            template: template.to_string(),
            quiet,
            len: None,
        }
    }

    /// Sets the number of steps. Without a length the bar is drawn as
    /// a spinner.
    pub(crate) fn len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub(crate) fn build(self) -> ProgressBar {
        let pbar = match self.len {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };

        if self.quiet {
            pbar.set_draw_target(ProgressDrawTarget::hidden());
        }

        let style = ProgressStyle::with_template(&self.template)
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        pbar.set_style(style);
        pbar
    }
}
