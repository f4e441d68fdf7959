//! Read-side query helpers: substring search, grouping, date-range filters.
//!
//! Everything here is a pure function over already-loaded entities; callers
//! take a snapshot first and filter afterwards.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Entities that expose named text fields to [`search`].
pub trait Searchable {
    /// Text of the named field, `None` when the entity has no such field or
    /// the field is empty.
    fn search_field(&self, field: &str) -> Option<Cow<'_, str>>;

    /// Fields searched when the caller does not name any.
    fn default_search_fields() -> &'static [&'static str];
}

/// Entities carrying an ISO-8601 timestamp for [`filter_by_date_range`].
pub trait Timestamped {
    /// RFC 3339 timestamp, fixed width so it sorts lexicographically.
    fn timestamp_iso(&self) -> Cow<'_, str>;
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp_iso(&self) -> Cow<'_, str> {
        (**self).timestamp_iso()
    }
}

/// Case-insensitive substring search across `fields`.
///
/// The query is trimmed; an empty query returns every entity unfiltered.
/// An entity matches when any of the named fields contains the query.
/// Input order is preserved.
pub fn search<T: Searchable>(entities: Vec<T>, query: &str, fields: &[&str]) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entities;
    }

    let fields: &[&str] = if fields.is_empty() {
        T::default_search_fields()
    } else {
        fields
    };

    entities
        .into_iter()
        .filter(|entity| {
            fields.iter().any(|field| {
                entity
                    .search_field(field)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
        .collect()
}

/// Partition `entities` by `key_fn`.
///
/// Every entity lands in exactly one group; within a group, input order is
/// preserved. Groups are ordered by key.
pub fn group_by_key<T, K, F>(entities: impl IntoIterator<Item = T>, key_fn: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for entity in entities {
        groups.entry(key_fn(&entity)).or_default().push(entity);
    }
    groups
}

/// Keep entries whose timestamp lies in `[from, to]`.
///
/// Bounds are compared as strings against the entry's ISO-8601 timestamp, so
/// a bare date such as `2024-05-01` as `to` excludes entries later that day.
/// A missing or blank bound is open.
pub fn filter_by_date_range<T: Timestamped>(
    entries: impl IntoIterator<Item = T>,
    from: Option<&str>,
    to: Option<&str>,
) -> Vec<T> {
    let from = from.map(str::trim).filter(|s| !s.is_empty());
    let to = to.map(str::trim).filter(|s| !s.is_empty());

    entries
        .into_iter()
        .filter(|entry| {
            let ts = entry.timestamp_iso();
            from.is_none_or(|f| ts.as_ref() >= f) && to.is_none_or(|t| ts.as_ref() <= t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: &'static str,
        email: Option<&'static str>,
        at: &'static str,
    }

    impl Searchable for Person {
        fn search_field(&self, field: &str) -> Option<Cow<'_, str>> {
            match field {
                "name" => Some(Cow::Borrowed(self.name)),
                "email" => self.email.map(Cow::Borrowed),
                _ => None,
            }
        }

        fn default_search_fields() -> &'static [&'static str] {
            &["name", "email"]
        }
    }

    impl Timestamped for Person {
        fn timestamp_iso(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.at)
        }
    }

    fn people() -> Vec<Person> {
        vec![
            Person { name: "Иван Петров", email: Some("ivan@mail.com"), at: "2024-01-01T10:00:00.000Z" },
            Person { name: "Мария Сидорова", email: None, at: "2024-01-02T10:00:00.000Z" },
            Person { name: "Алексей Юристов", email: Some("alex@mail.com"), at: "2024-01-03T10:00:00.000Z" },
        ]
    }

    #[test]
    fn search_is_case_insensitive_on_cyrillic() {
        let found = search(people(), "юрист", &["name"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Алексей Юристов");
    }

    #[test]
    fn blank_query_returns_everything() {
        assert_eq!(search(people(), "   ", &["name"]), people());
    }

    #[test]
    fn search_only_looks_at_named_fields() {
        assert!(search(people(), "mail.com", &["name"]).is_empty());
        assert_eq!(search(people(), "MAIL.COM", &["email"]).len(), 2);
        assert_eq!(search(people(), "mail.com", &[]).len(), 2);
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let hits = filter_by_date_range(
            people(),
            Some("2024-01-02T10:00:00.000Z"),
            Some("2024-01-03T10:00:00.000Z"),
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(filter_by_date_range(people(), None, None).len(), 3);

        let all = people();
        let borrowed = filter_by_date_range(all.iter(), Some("2024-01-02"), None);
        assert_eq!(borrowed.len(), filter_by_date_range(people(), Some("2024-01-02"), None).len());
        assert_eq!(filter_by_date_range(people(), Some(""), Some("2024-01-01T23")).len(), 1);
    }

    #[test]
    fn grouping_keeps_input_order_inside_groups() {
        let groups = group_by_key(vec![("IT", 1), ("Клининг", 2), ("IT", 3)], |(k, _)| *k);
        assert_eq!(groups["IT"], vec![("IT", 1), ("IT", 3)]);
        assert_eq!(groups["Клининг"], vec![("Клининг", 2)]);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Grouping is a partition: flattening the groups gives back the input multiset.
            #[test]
            fn grouping_is_a_partition(items in proptest::collection::vec((0u8..5, any::<u32>()), 0..50)) {
                let groups = group_by_key(items.clone(), |(k, _)| *k);

                let mut flattened: Vec<(u8, u32)> = groups.values().flatten().copied().collect();
                let mut expected = items.clone();
                flattened.sort();
                expected.sort();
                prop_assert_eq!(flattened, expected);

                for (key, members) in &groups {
                    prop_assert!(members.iter().all(|(k, _)| k == key));
                }
            }
        }
    }
}
