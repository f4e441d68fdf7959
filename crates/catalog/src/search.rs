//! Named text fields exposed to the query facade.

use std::borrow::Cow;

use unitdesk_core::Searchable;

use crate::{Performer, Service};

impl Searchable for Service {
    fn search_field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id_typed().as_str())),
            "name" => Some(Cow::Borrowed(self.name())),
            "category" => Some(Cow::Borrowed(self.category())),
            "duration" => Some(Cow::Borrowed(self.duration())),
            "description" => self.description().map(Cow::Borrowed),
            _ => None,
        }
    }

    fn default_search_fields() -> &'static [&'static str] {
        &["name", "category", "description"]
    }
}

impl Searchable for Performer {
    fn search_field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "id" => Some(Cow::Borrowed(self.id_typed().as_str())),
            "name" => Some(Cow::Borrowed(self.name())),
            "email" => self.email().map(Cow::Borrowed),
            "phone" => self.phone().map(Cow::Borrowed),
            "skills" => Some(Cow::Owned(self.skills_line())),
            "experience" => self.experience().map(Cow::Borrowed),
            _ => None,
        }
    }

    fn default_search_fields() -> &'static [&'static str] {
        &["name", "skills", "email"]
    }
}
