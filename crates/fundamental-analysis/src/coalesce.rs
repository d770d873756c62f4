use fundamentals_core::{Source, Sourced};

/// First present value in positional order.
pub fn coalesce<T, I>(values: I) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    values.into_iter().flatten().next()
}

/// Provider value if present, else the database value, else nothing.
pub fn coalesce_with_source<T>(provider: Option<T>, database: Option<T>) -> Sourced<T> {
    match (provider, database) {
        (Some(value), _) => Sourced::provider(Some(value)),
        (None, Some(value)) => Sourced::database(Some(value)),
        (None, None) => Sourced::none(),
    }
}

pub fn source_for<T>(value: &Option<T>, source: Source) -> Source {
    if value.is_some() {
        source
    } else {
        Source::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesce_positional() {
        assert_eq!(coalesce([None, Some(2), Some(3)]), Some(2));
        assert_eq!(coalesce::<i32, _>([None, None]), None);
        assert_eq!(coalesce(vec![Some(0.0), Some(1.0)]), Some(0.0));
    }

    #[test]
    fn test_coalesce_with_source() {
        let v = coalesce_with_source(Some(42.0), Some(24.0));
        assert_eq!((v.value, v.source), (Some(42.0), Source::Provider));

        let v = coalesce_with_source(None, Some(24.0));
        assert_eq!((v.value, v.source), (Some(24.0), Source::Database));

        let v = coalesce_with_source::<f64>(None, None);
        assert_eq!((v.value, v.source), (None, Source::None));
    }

    #[test]
    fn test_zero_provider_value_still_wins() {
        let v = coalesce_with_source(Some(0.0), Some(24.0));
        assert_eq!(v.source, Source::Provider);
        assert_eq!(v.value, Some(0.0));
    }

    #[test]
    fn test_source_for() {
        assert_eq!(source_for(&Some(1.0), Source::Calculated), Source::Calculated);
        assert_eq!(source_for::<f64>(&None, Source::Provider), Source::None);
    }
}
