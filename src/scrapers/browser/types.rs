//! Browser render result types.

/// Markup read back from a rendered listing page.
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    /// None of the ready selectors showed up before the timeout.
    pub ready_timed_out: bool,
    /// Rendering broke after navigation; `html` is whatever was loaded by then.
    pub render_error: Option<String>,
}
