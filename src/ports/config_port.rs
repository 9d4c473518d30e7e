//! Configuration access port trait.

/// Raw string lookups by INI section and key. Typed parsing and defaults
/// belong to the caller, which knows what each key means.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Section names present in the source, sorted.
    fn sections(&self) -> Vec<String>;

    /// Key names present in `section`, sorted. Empty for a missing section.
    fn keys(&self, section: &str) -> Vec<String>;
}
