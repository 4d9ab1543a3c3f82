use std::collections::BTreeMap;

/// An entity with a statically declared set of persisted columns.
pub trait Columns {
    /// Names of the columns backing the entity, in table order.
    const COLUMNS: &'static [&'static str];

    fn is_column(key: &str) -> bool {
        Self::COLUMNS.contains(&key)
    }

    /// Comma separated column list, ready to be used in a `SELECT`.
    fn select_list() -> String {
        Self::COLUMNS.join(", ")
    }
}

/// Keeps only the entries whose keys are columns of `E`.
/// Unknown keys are dropped silently, missing ones are left for validation.
pub fn project<E, K, V, I>(values: I) -> BTreeMap<String, V>
where
    E: Columns,
    K: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    values
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .filter(|(key, _)| E::is_column(key))
        .collect()
}
