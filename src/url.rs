/// Everything needed to address one render query.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryParams {
    /// Graphite root, e.g. `http://graphite.example.com`.
    pub base_url: String,
    /// Metric path, interpolated as given.
    pub target: String,
    pub from_minutes: u32,
    /// Multiplier applied by graphite through `scale()`. `1.0` means no scaling.
    pub scale: f64,
}

/// Builds the render API url for `params`.
///
/// The target is not url-encoded. A scale of exactly `1.0` cannot be told apart from the default
/// and always yields the unscaled query.
///
/// ```rust
/// # use check_graphite::url::{render_url, QueryParams};
/// let params = QueryParams {
///     base_url: "http://graphite".to_owned(),
///     target: "a.b".to_owned(),
///     from_minutes: 10,
///     scale: 0.5,
/// };
/// assert_eq!(
///     render_url(&params),
///     "http://graphite/render/?target=scale(a.b,0.50)&format=json&from=-10mins"
/// );
/// ```
pub fn render_url(params: &QueryParams) -> String {
    let target = if params.scale == 1.0 {
        params.target.clone()
    } else {
        format!("scale({},{:.2})", params.target, params.scale)
    };

    format!(
        "{}/render/?target={}&format=json&from=-{}mins",
        params.base_url, target, params.from_minutes
    )
}
