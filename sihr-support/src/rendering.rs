//! Text rendering utilities for resolver diagnostics.
//!
//! Provides helpers to name types the way the container sees them,
//! render resolution chains, and suggest close identifiers when a
//! lookup misses.

/// Renders a resolution chain as a readable string.
///
/// Consecutive duplicates are collapsed, so a service id and the type it
/// instantiates under the same name only show up once.
///
/// # Examples
/// ```
/// use sihr_support::rendering::render_chain;
///
/// let chain = vec!["Mailer", "Mailer", "Greeter", "Mailer"];
/// assert_eq!(render_chain(&chain), "Mailer → Greeter → Mailer");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut rendered: Vec<&str> = Vec::with_capacity(chain.len());
    for link in chain.iter().map(AsRef::as_ref) {
        if rendered.last() != Some(&link) {
            rendered.push(link);
        }
    }
    rendered.join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// Every path keeps only its last segment; generic arguments, references
/// and tuples are shortened in place.
///
/// ```
/// use sihr_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::notify::Notifier");
/// assert_eq!(short, "Notifier");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::notify::Transport>");
/// assert_eq!(short, "Arc<dyn Transport>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    const DELIMITERS: &[char] = &['<', '>', ',', ' ', '(', ')', '[', ']', ';', '&'];

    let mut short = String::with_capacity(full_name.len());
    let mut rest = full_name;
    while let Some(at) = rest.find(DELIMITERS) {
        short.push_str(last_segment(&rest[..at]));
        short.push_str(&rest[at..=at]);
        rest = &rest[at + 1..];
    }
    short.push_str(last_segment(rest));
    short
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Turns a Rust type name into the name the container registers it under.
///
/// Paths are shortened, and trait objects lose their `dyn` keyword and any
/// additional bounds so `dyn app::Mailer + Send + Sync` becomes `Mailer`.
///
/// ```
/// use sihr_support::rendering::container_type_name;
///
/// assert_eq!(container_type_name("app::mail::SmtpMailer"), "SmtpMailer");
/// assert_eq!(container_type_name("dyn app::mail::Mailer + core::marker::Send"), "Mailer");
/// ```
pub fn container_type_name(full_name: &str) -> String {
    let short = shorten_type_name(full_name);
    match short.strip_prefix("dyn ") {
        Some(object) => object
            .split(" + ")
            .next()
            .unwrap_or(object)
            .trim()
            .to_string(),
        None => short,
    }
}

/// Picks "did you mean?" candidates for a lookup that missed.
///
/// Names containing the request (or contained in it) come first, closest
/// length first; then names sharing a prefix of three or more characters.
/// Comparison is case-insensitive on shortened names.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let wanted = shorten_type_name(requested).to_lowercase();
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<((u8, usize), &str)> = available
        .iter()
        .copied()
        .filter(|name| *name != requested)
        .filter_map(|name| {
            let candidate = shorten_type_name(name).to_lowercase();
            closeness(&wanted, &candidate).map(|rank| (rank, name))
        })
        .collect();

    ranked.sort();
    ranked.dedup_by(|a, b| a.1 == b.1);
    ranked
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Lower ranks are closer. `None` when the names have little in common.
fn closeness(wanted: &str, candidate: &str) -> Option<(u8, usize)> {
    if candidate.contains(wanted) || wanted.contains(candidate) {
        return Some((0, wanted.len().abs_diff(candidate.len())));
    }

    let shared = wanted
        .chars()
        .zip(candidate.chars())
        .take_while(|(a, b)| a == b)
        .count();
    (shared >= 3).then_some((1, usize::MAX - shared))
}
